//! Debounced, time- and size-bounded batch scheduling.
//!
//! The scheduler is a plain state machine driven by the host's event loop:
//!
//! ```text
//!   Idle ──schedule──▶ Debouncing ──deadline reached──▶ Running
//!    ▲                    ▲  │ schedule (deadline kept)    │
//!    │                    │  └──────────                   │
//!    │                    └──── dirty blocks remain ───────┤
//!    └──────────────────────── dirty set drained ──────────┘
//! ```
//!
//! A pass snapshots the dirty blocks in ascending order at its start, so
//! blocks marked while it runs wait for the next pass. Budgets are checked
//! between blocks only; a pass always tokenizes at least one block.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use super::blocks::BlockId;
use super::dirty::DirtyTracker;
use super::options::HighlighterOptions;

/// Source of wall-clock time for budgets and deadlines.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Scheduler lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// No pass pending.
    Idle,
    /// A pass is armed to run once `deadline` has passed.
    Debouncing { deadline: Instant },
    /// A pass is executing.
    Running,
}

/// Result of processing one block inside a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The block was tokenized and its spans stored.
    Highlighted,
    /// The host no longer has this block.
    Invalid,
}

/// Why a pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Every block in the snapshot was handled.
    Drained,
    /// `batch_size` blocks were tokenized.
    BatchLimit,
    /// The time budget ran out.
    TimeBudget,
}

/// Summary of one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchReport {
    /// Blocks tokenized in this pass.
    pub processed: usize,
    /// Invalid blocks dropped from the dirty set.
    pub dropped: usize,
    /// Dirty blocks left for later passes.
    pub remaining: usize,
    pub elapsed: Duration,
    pub stop: StopReason,
}

/// Cooperative scheduler for one document.
pub struct Scheduler {
    options: HighlighterOptions,
    state: SchedulerState,
    clock: Box<dyn Clock>,
    passes: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new(options: HighlighterOptions) -> Self {
        Self::with_clock(options, Box::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(options: HighlighterOptions, clock: Box<dyn Clock>) -> Self {
        Self {
            options: options.normalized(),
            state: SchedulerState::Idle,
            clock,
            passes: 0,
        }
    }

    #[must_use]
    pub fn options(&self) -> HighlighterOptions {
        self.options
    }

    pub fn set_options(&mut self, options: HighlighterOptions) {
        self.options = options.normalized();
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.options.batch_size = batch_size.max(1);
    }

    pub fn set_max_highlight_time(&mut self, budget: Duration) {
        self.options = self.options.with_max_highlight_time(budget);
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of passes run so far.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Arm the debounce timer if nothing is pending.
    ///
    /// An armed timer is never pushed back, so a burst of edits collapses
    /// into one pass instead of postponing it.
    pub fn schedule(&mut self) {
        if self.state == SchedulerState::Idle {
            self.arm();
        }
    }

    fn arm(&mut self) {
        let deadline = self.clock.now() + self.options.debounce;
        self.state = SchedulerState::Debouncing { deadline };
    }

    /// When the host should next call [`Scheduler::is_due`].
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Whether the armed timer has fired at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.state, SchedulerState::Debouncing { deadline } if now >= deadline)
    }

    /// Disarm a pending timer. Dirty blocks are left in place.
    pub fn cancel(&mut self) {
        if matches!(self.state, SchedulerState::Debouncing { .. }) {
            self.state = SchedulerState::Idle;
        }
    }

    /// Run one pass over the dirty blocks of `tracker`.
    ///
    /// `process` is called for each block in ascending positional order until
    /// the snapshot is exhausted or a budget is hit. Afterwards the scheduler
    /// re-arms itself if dirty blocks remain and goes idle otherwise.
    pub fn run_batch<F>(&mut self, tracker: &mut DirtyTracker, mut process: F) -> BatchReport
    where
        F: FnMut(usize, BlockId) -> BlockOutcome,
    {
        self.state = SchedulerState::Running;
        let start = self.clock.now();
        let snapshot = tracker.dirty_snapshot();
        let batch_size = self.options.batch_size;
        let budget = self.options.max_highlight_time;

        let mut processed = 0usize;
        let mut dropped = 0usize;
        let mut stop = StopReason::Drained;

        for (index, id) in snapshot {
            if processed >= batch_size {
                stop = StopReason::BatchLimit;
                break;
            }
            if processed > 0 && self.clock.now().saturating_duration_since(start) > budget {
                stop = StopReason::TimeBudget;
                break;
            }
            match process(index, id) {
                BlockOutcome::Highlighted => {
                    tracker.complete(id);
                    processed += 1;
                }
                BlockOutcome::Invalid => {
                    tracker.discard(id);
                    dropped += 1;
                }
            }
        }

        let elapsed = self.clock.now().saturating_duration_since(start);
        let remaining = tracker.dirty_count();
        self.passes += 1;
        if remaining > 0 {
            self.arm();
        } else {
            self.state = SchedulerState::Idle;
        }

        debug!(
            pass = self.passes,
            processed,
            dropped,
            remaining,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            ?stop,
            "highlight pass finished"
        );

        BatchReport {
            processed,
            dropped,
            remaining,
            elapsed,
            stop,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(HighlighterOptions::default())
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}
