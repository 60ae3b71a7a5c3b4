//! Highlighter configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default maximum number of blocks tokenized per pass.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Default wall-clock budget for one pass.
pub const DEFAULT_MAX_HIGHLIGHT_TIME: Duration = Duration::from_millis(20);
/// Default delay between the first edit of a burst and the pass it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);

const MIN_HIGHLIGHT_TIME: Duration = Duration::from_millis(1);

/// Scheduling limits for incremental highlighting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlighterOptions {
    /// Maximum blocks tokenized per pass (at least 1).
    pub batch_size: usize,
    /// Time budget for one pass (at least 1 ms).
    pub max_highlight_time: Duration,
    /// Debounce delay before a scheduled pass runs.
    pub debounce: Duration,
}

impl Default for HighlighterOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_highlight_time: DEFAULT_MAX_HIGHLIGHT_TIME,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl HighlighterOptions {
    /// Strict constructor: rejects values below the minimums instead of
    /// clamping them.
    pub fn try_new(batch_size: usize, max_highlight_ms: u64, debounce_ms: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidSetting {
                name: "batch_size",
                value: 0,
            });
        }
        if max_highlight_ms == 0 {
            return Err(Error::InvalidSetting {
                name: "max_highlight_time_ms",
                value: 0,
            });
        }
        Ok(Self {
            batch_size,
            max_highlight_time: Duration::from_millis(max_highlight_ms),
            debounce: Duration::from_millis(debounce_ms),
        })
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_highlight_time(mut self, budget: Duration) -> Self {
        self.max_highlight_time = budget.max(MIN_HIGHLIGHT_TIME);
        self
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Copy with every field raised to its minimum.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            batch_size: self.batch_size.max(1),
            max_highlight_time: self.max_highlight_time.max(MIN_HIGHLIGHT_TIME),
            debounce: self.debounce,
        }
    }
}
