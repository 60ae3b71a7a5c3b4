//! Incremental highlighting for one document.
//!
//! [`IncrementalHighlighter`] wires the pieces together: host edits go to the
//! [`DirtyTracker`], which arms the [`Scheduler`]; each pass tokenizes dirty
//! blocks with the [`Tokenizer`], writes the [`BlockStore`], and announces
//! changes on the [`EventBus`].

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use tracing::debug;

use super::blocks::{BlockId, BlockStore};
use super::dirty::DirtyTracker;
use super::options::HighlighterOptions;
use super::scheduler::{BatchReport, BlockOutcome, Clock, Scheduler, SchedulerState};
use super::span::{Span, StyleId};
use super::styles::StyleTable;
use super::tokenizer::{RuleTokenizer, Tokenizer};
use crate::error::{Error, Result};
use crate::event::{EventBus, HighlightEvent};
use crate::text::{Document, Edit};

/// Highlighting state for one document.
///
/// The highlighter never holds the document; every call that needs text
/// borrows it, so the host stays free to mutate it between calls.
///
/// # Example
///
/// ```
/// use blocklight::{IncrementalHighlighter, RopeDocument};
///
/// let mut doc = RopeDocument::from_str("def f():\n    return 1");
/// let mut highlighter = IncrementalHighlighter::python();
/// highlighter.request_full_rehighlight(&doc);
/// highlighter.drain(&doc);
/// assert!(!highlighter.spans_for(0).is_empty());
///
/// let edit = doc.insert(0, "# note\n");
/// highlighter.on_edit(&doc, edit);
/// assert_eq!(highlighter.pending_dirty_count(), 2);
/// ```
pub struct IncrementalHighlighter {
    tokenizer: Arc<dyn Tokenizer>,
    tracker: DirtyTracker,
    scheduler: Scheduler,
    store: BlockStore,
    events: EventBus,
}

impl IncrementalHighlighter {
    /// Create a highlighter with default options.
    #[must_use]
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self::with_options(tokenizer, HighlighterOptions::default())
    }

    #[must_use]
    pub fn with_options(tokenizer: Arc<dyn Tokenizer>, options: HighlighterOptions) -> Self {
        Self::from_parts(tokenizer, Scheduler::new(options))
    }

    /// Create a highlighter measuring budgets and deadlines with `clock`.
    #[must_use]
    pub fn with_clock(
        tokenizer: Arc<dyn Tokenizer>,
        options: HighlighterOptions,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self::from_parts(tokenizer, Scheduler::with_clock(options, clock))
    }

    fn from_parts(tokenizer: Arc<dyn Tokenizer>, scheduler: Scheduler) -> Self {
        Self {
            tokenizer,
            tracker: DirtyTracker::new(),
            scheduler,
            store: BlockStore::new(),
            events: EventBus::new(),
        }
    }

    /// Highlighter using the built-in Python rules.
    #[must_use]
    pub fn python() -> Self {
        Self::new(Arc::new(RuleTokenizer::python()))
    }

    #[must_use]
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Swap the tokenizer and schedule a full rehighlight of `doc`.
    ///
    /// Stored spans are discarded: their style ids belong to the old
    /// tokenizer's table, and every block is announced again once re-tokenized.
    pub fn set_tokenizer(&mut self, tokenizer: Arc<dyn Tokenizer>, doc: &dyn Document) {
        self.tokenizer = tokenizer;
        self.store.clear();
        self.request_full_rehighlight(doc);
    }

    /// Style names for the ids found in spans.
    #[must_use]
    pub fn styles(&self) -> &StyleTable {
        self.tokenizer.styles()
    }

    /// Name of a style id, if the tokenizer knows it.
    #[must_use]
    pub fn style_name(&self, style: StyleId) -> Option<&str> {
        self.tokenizer.styles().name(style)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    #[must_use]
    pub fn options(&self) -> HighlighterOptions {
        self.scheduler.options()
    }

    pub fn set_options(&mut self, options: HighlighterOptions) {
        self.scheduler.set_options(options);
    }

    /// Maximum blocks per pass; values below 1 are raised to 1.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.scheduler.set_batch_size(batch_size);
    }

    /// Time budget per pass; values below 1 ms are raised to 1 ms.
    pub fn set_max_highlight_time_ms(&mut self, ms: u64) {
        self.scheduler
            .set_max_highlight_time(Duration::from_millis(ms));
    }

    // ------------------------------------------------------------------
    // Marking work
    // ------------------------------------------------------------------

    /// Record an edit the host has already applied to `doc`.
    pub fn on_edit(&mut self, doc: &dyn Document, edit: Edit) {
        let outcome = self.tracker.on_edit(doc, edit);
        self.retire(&outcome.retired);
        self.scheduler.schedule();
    }

    /// Mark every block dirty.
    pub fn request_full_rehighlight(&mut self, doc: &dyn Document) {
        let outcome = self.tracker.mark_all(doc.block_count());
        self.retire(&outcome.retired);
        debug!(blocks = doc.block_count(), "full rehighlight requested");
        self.scheduler.schedule();
    }

    /// Mark one block dirty.
    pub fn rehighlight_block(&mut self, index: usize) -> Result<()> {
        if !self.tracker.mark_one(index) {
            return Err(Error::InvalidBlock {
                index,
                block_count: self.tracker.table().len(),
            });
        }
        self.scheduler.schedule();
        Ok(())
    }

    /// Reconcile with a block count change the host made without an edit
    /// notification, dropping state for blocks past the new end.
    pub fn on_block_count_changed(&mut self, block_count: usize) {
        let retired = self.tracker.sync_block_count(block_count);
        self.retire(&retired);
    }

    fn retire(&mut self, retired: &[BlockId]) {
        for &block in retired {
            self.store.remove(block);
            if !self.events.is_empty() {
                self.events.emit(&HighlightEvent::BlockRemoved { block });
            }
        }
    }

    // ------------------------------------------------------------------
    // Running passes
    // ------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// When the host should call [`on_tick`](Self::on_tick) next, if at all.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// True when no pass is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.scheduler.state() == SchedulerState::Idle
    }

    /// Drive the debounce timer. Runs a pass if the deadline has passed.
    pub fn on_tick(&mut self, doc: &dyn Document, now: Instant) -> Option<BatchReport> {
        if !self.scheduler.is_due(now) {
            return None;
        }
        Some(self.run_batch(doc))
    }

    /// Run one pass now, regardless of the debounce timer.
    pub fn run_batch(&mut self, doc: &dyn Document) -> BatchReport {
        let block_count = doc.block_count();
        if block_count != self.tracker.table().len() {
            self.on_block_count_changed(block_count);
        }

        let tokenizer = &self.tokenizer;
        let store = &mut self.store;
        let events = &mut self.events;

        let report = self.scheduler.run_batch(&mut self.tracker, |index, block| {
            let Some(text) = doc.block_text(index) else {
                debug!(index, %block, "dropping invalid block");
                store.remove(block);
                return BlockOutcome::Invalid;
            };
            let spans = tokenizer.tokenize_block(&text);
            if store.insert(block, spans) && !events.is_empty() {
                let spans = store.get(block).map(<[Span]>::to_vec).unwrap_or_default();
                events.emit(&HighlightEvent::BlockHighlighted {
                    index,
                    block,
                    spans,
                });
            }
            BlockOutcome::Highlighted
        });

        if !self.events.is_empty() {
            self.events.emit(&HighlightEvent::PassFinished(report));
        }
        report
    }

    /// Run passes until no block is dirty. Returns the number of passes.
    pub fn drain(&mut self, doc: &dyn Document) -> usize {
        let mut passes = 0;
        while self.tracker.has_dirty() {
            self.run_batch(doc);
            passes += 1;
        }
        self.scheduler.cancel();
        passes
    }

    /// Disarm the pending pass; dirty blocks stay dirty.
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn pending_dirty_count(&self) -> usize {
        self.tracker.dirty_count()
    }

    #[must_use]
    pub fn is_dirty(&self, index: usize) -> bool {
        self.tracker.is_dirty(index)
    }

    /// Blocks tokenized since the last [`clear_modified`](Self::clear_modified).
    #[must_use]
    pub fn modified_count(&self) -> usize {
        self.tracker.modified_count()
    }

    pub fn clear_modified(&mut self) {
        self.tracker.clear_modified();
    }

    /// Latest spans for block `index`, or `None` if it was never tokenized.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[Span]> {
        let block = self.tracker.table().id_at(index)?;
        self.store.get(block)
    }

    /// Latest spans for block `index`; empty if none are known.
    #[must_use]
    pub fn spans_for(&self, index: usize) -> &[Span] {
        self.get(index).unwrap_or(&[])
    }

    /// Stable id of the block currently at `index`.
    #[must_use]
    pub fn block_id(&self, index: usize) -> Option<BlockId> {
        self.tracker.table().id_at(index)
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&HighlightEvent) + Send + 'static,
    {
        self.events.subscribe(callback);
    }

    pub fn subscribe_channel(&mut self) -> Receiver<HighlightEvent> {
        self.events.subscribe_channel()
    }
}

impl fmt::Debug for IncrementalHighlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalHighlighter")
            .field("tokenizer", &self.tokenizer.name())
            .field("tracker", &self.tracker)
            .field("scheduler", &self.scheduler)
            .field("stored", &self.store.len())
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Once;

    use super::*;
    use crate::highlight::StopReason;
    use crate::highlight::rules::RuleSet;
    use crate::highlight::scheduler::test_clock::SteppingClock;
    use crate::text::RopeDocument;

    fn setup_test_logging() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_test_writer()
                .try_init();
        });
    }

    fn numbered_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("x = {i}  # line"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn highlighter(batch_size: usize, clock: SteppingClock) -> IncrementalHighlighter {
        let options = HighlighterOptions::default()
            .with_batch_size(batch_size)
            .with_max_highlight_time(Duration::from_secs(1));
        IncrementalHighlighter::with_clock(
            Arc::new(RuleTokenizer::python()),
            options,
            Box::new(clock),
        )
    }

    #[test]
    fn test_scenario_spans_for_def_line() {
        setup_test_logging();
        let rules = RuleSet::from_pairs([
            (r"\bdef\b", "keyword"),
            ("'[^']*'", "string"),
            (r"#[^\n]*", "comment"),
        ]);
        let tokenizer = Arc::new(RuleTokenizer::new("Scenario", &[], rules));
        let doc = RopeDocument::from_str("def f():  # x");
        let mut hl = IncrementalHighlighter::new(tokenizer);

        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);

        let keyword = hl.styles().id("keyword").unwrap();
        let comment = hl.styles().id("comment").unwrap();
        assert_eq!(
            hl.spans_for(0),
            &[Span::new(0, 3, keyword), Span::new(10, 3, comment)]
        );
    }

    #[test]
    fn test_batch_of_two_leaves_rest_dirty_and_rearms() {
        setup_test_logging();
        let doc = RopeDocument::from_str(&numbered_lines(4));
        let mut hl = highlighter(2, SteppingClock::new(Duration::ZERO));
        hl.request_full_rehighlight(&doc);

        let report = hl.run_batch(&doc);

        assert_eq!(report.processed, 2);
        assert!(hl.get(0).is_some() && hl.get(1).is_some());
        assert!(hl.is_dirty(2) && hl.is_dirty(3));
        assert_eq!(hl.pending_dirty_count(), 2);
        assert!(matches!(hl.state(), SchedulerState::Debouncing { .. }));
    }

    #[test]
    fn test_full_rehighlight_of_thousand_blocks_takes_twenty_passes() {
        let doc = RopeDocument::from_str(&numbered_lines(1_000));
        let mut hl = highlighter(50, SteppingClock::new(Duration::ZERO));
        hl.request_full_rehighlight(&doc);
        assert_eq!(hl.drain(&doc), 20);
        assert_eq!(hl.pending_dirty_count(), 0);
        assert_eq!(hl.modified_count(), 1_000);
        assert!(hl.is_idle());
    }

    #[test]
    fn test_tick_waits_for_debounce() {
        let clock = SteppingClock::new(Duration::ZERO);
        let handle = clock.clone();
        let mut doc = RopeDocument::from_str("a\nb");
        let mut hl = highlighter(10, clock);
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);

        let edit = doc.insert(0, "if ");
        hl.on_edit(&doc, edit);
        assert!(hl.on_tick(&doc, handle.peek()).is_none());

        handle.advance(Duration::from_millis(10));
        let report = hl.on_tick(&doc, handle.peek()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.stop, StopReason::Drained);
        assert!(hl.is_idle());
        assert_eq!(hl.spans_for(0).len(), 1);
    }

    #[test]
    fn test_spans_follow_block_after_insert_above() {
        let mut doc = RopeDocument::from_str("pass\n# tail");
        let mut hl = IncrementalHighlighter::python();
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);
        let tail = hl.spans_for(1).to_vec();
        let tail_id = hl.block_id(1);

        let edit = doc.insert(0, "x = 1\ny = 2\n");
        hl.on_edit(&doc, edit);

        assert_eq!(hl.block_id(3), tail_id);
        assert_eq!(hl.spans_for(3), tail.as_slice());
        assert!(!hl.is_dirty(3));
        assert_eq!(hl.pending_dirty_count(), 3);
    }

    #[test]
    fn test_deleted_blocks_are_purged() {
        let mut doc = RopeDocument::from_str("a = 1\nb = 2\nc = 3");
        let mut hl = IncrementalHighlighter::python();
        let rx = hl.subscribe_channel();
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);
        while rx.try_recv().is_ok() {}

        let edit = doc.remove(6..12);
        hl.on_edit(&doc, edit);

        assert_eq!(doc.to_string(), "a = 1\nc = 3");
        assert!(matches!(
            rx.try_recv(),
            Ok(HighlightEvent::BlockRemoved { .. })
        ));
        assert_eq!(hl.get(2), None);
        assert!(hl.get(1).is_some());
    }

    #[test]
    fn test_shrinking_document_without_edit_drops_blocks() {
        let mut doc = RopeDocument::from_str("a\nb\nc");
        let mut hl = IncrementalHighlighter::python();
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);

        doc.set_text("a");
        hl.rehighlight_block(0).unwrap();
        let report = hl.run_batch(&doc);

        assert_eq!(report.processed, 1);
        assert_eq!(hl.get(1), None);
        assert!(matches!(
            hl.rehighlight_block(2),
            Err(Error::InvalidBlock {
                index: 2,
                block_count: 1
            })
        ));
    }

    #[test]
    fn test_events_carry_changed_spans_only() {
        let doc = RopeDocument::from_str("pass\nreturn");
        let mut hl = IncrementalHighlighter::python();
        let rx = hl.subscribe_channel();

        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);
        let first: Vec<_> = rx.try_iter().collect();
        assert_eq!(first.len(), 3);
        assert!(matches!(
            &first[0],
            HighlightEvent::BlockHighlighted { index: 0, spans, .. } if spans.len() == 1
        ));
        assert!(matches!(first[2], HighlightEvent::PassFinished(_)));

        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);
        let second: Vec<_> = rx.try_iter().collect();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_modified_ledger_can_be_cleared() {
        let doc = RopeDocument::from_str("a\nb");
        let mut hl = IncrementalHighlighter::python();
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);
        assert_eq!(hl.modified_count(), 2);

        hl.clear_modified();
        assert_eq!(hl.modified_count(), 0);
        hl.rehighlight_block(1).unwrap();
        hl.drain(&doc);
        assert_eq!(hl.modified_count(), 1);
    }

    #[test]
    fn test_settings_are_clamped() {
        let mut hl = IncrementalHighlighter::python();
        hl.set_batch_size(0);
        hl.set_max_highlight_time_ms(0);
        assert_eq!(hl.options().batch_size, 1);
        assert_eq!(hl.options().max_highlight_time, Duration::from_millis(1));
    }

    #[test]
    fn test_set_tokenizer_rehighlights_everything() {
        let doc = RopeDocument::from_str("def f(): pass\n# done");
        let mut hl = IncrementalHighlighter::python();
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);

        let plain = RuleTokenizer::new("Plain", &[], RuleSet::from_pairs([("f", "letter")]));
        hl.set_tokenizer(Arc::new(plain), &doc);
        assert_eq!(hl.pending_dirty_count(), 2);
        hl.drain(&doc);
        let letter = hl.styles().id("letter").unwrap();
        assert!(hl.spans_for(0).iter().all(|span| span.style == letter));
        assert_eq!(hl.style_name(letter), Some("letter"));
    }

    #[test]
    fn test_set_tokenizer_announces_blocks_with_same_span_shape() {
        let doc = RopeDocument::from_str("for");
        let mut hl = IncrementalHighlighter::python();
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);
        let before = hl.spans_for(0).to_vec();

        let loops = RuleTokenizer::new("Loops", &[], RuleSet::from_pairs([("for", "loop")]));
        let rx = hl.subscribe_channel();
        hl.set_tokenizer(Arc::new(loops), &doc);
        assert!(hl.get(0).is_none());

        hl.drain(&doc);
        assert_eq!(hl.spans_for(0), before.as_slice());
        assert_eq!(hl.style_name(hl.spans_for(0)[0].style), Some("loop"));
        let highlighted = rx
            .try_iter()
            .filter(|event| matches!(event, HighlightEvent::BlockHighlighted { .. }))
            .count();
        assert_eq!(highlighted, 1);
    }

    /// Host whose blocks can vanish without the block count changing.
    struct SparseDocument {
        blocks: Vec<Option<&'static str>>,
    }

    impl Document for SparseDocument {
        fn block_count(&self) -> usize {
            self.blocks.len()
        }

        fn block_text(&self, index: usize) -> Option<std::borrow::Cow<'_, str>> {
            self.blocks.get(index).copied().flatten().map(Into::into)
        }

        fn block_at(&self, _char_pos: usize) -> usize {
            0
        }
    }

    #[test]
    fn test_missing_block_text_drops_block() {
        setup_test_logging();
        let mut doc = SparseDocument {
            blocks: vec![Some("pass"), Some("# note"), Some("return")],
        };
        let mut hl = IncrementalHighlighter::python();
        hl.request_full_rehighlight(&doc);
        hl.drain(&doc);
        assert!(hl.get(1).is_some());

        doc.blocks[1] = None;
        hl.rehighlight_block(1).unwrap();
        hl.rehighlight_block(2).unwrap();
        let report = hl.run_batch(&doc);

        assert_eq!(report.processed, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.remaining, 0);
        assert_eq!(hl.get(1), None);
        assert!(hl.get(2).is_some());
        assert!(!hl.is_dirty(1));
        assert!(hl.is_idle());
    }

    #[test]
    fn test_highlighter_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<IncrementalHighlighter>();
    }
}
