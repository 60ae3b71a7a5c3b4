//! E2E tests for the incremental highlighting pipeline.
//!
//! Run with:
//!   cargo test --test `highlight_e2e` -- --nocapture
//! With logging:
//!   `RUST_LOG=debug` cargo test --test `highlight_e2e` -- --nocapture
//!
//! CI: runs under the default `cargo test` job.

use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use blocklight::highlight::{StyleTable, Tokenizer};
use blocklight::{
    Document, HighlightEvent, HighlighterOptions, IncrementalHighlighter, RopeDocument,
    RuleTokenizer, Span, TokenizerRegistry,
};
use tracing::{Level, debug, info, span};

const SAMPLE_PY: &str = include_str!("fixtures/sample.py");

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_test_writer()
        .try_init();
}

fn options(batch_size: usize) -> HighlighterOptions {
    HighlighterOptions::default()
        .with_batch_size(batch_size)
        .with_max_highlight_time(Duration::from_secs(5))
}

fn assert_spans_well_formed(spans: &[Span], line_len: usize) {
    let mut last_end = 0usize;
    for span in spans {
        assert!(span.len > 0, "span is empty");
        assert!(span.end() <= line_len, "span exceeds line length");
        assert!(span.offset >= last_end, "span overlaps previous span");
        last_end = span.end();
    }
}

/// Every block's stored spans match a from-scratch tokenization.
fn assert_matches_fresh(highlighter: &IncrementalHighlighter, doc: &RopeDocument) {
    let fresh = RuleTokenizer::python();
    for index in 0..doc.block_count() {
        let text = doc.block_text(index).unwrap_or_default();
        assert_eq!(
            highlighter.spans_for(index),
            fresh.tokenize_block(&text).as_slice(),
            "block {index} is stale: {text:?}"
        );
    }
}

fn render_line(text: &str, spans: &[Span], styles: &StyleTable) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut at = 0;
    for span in spans {
        out.extend(&chars[at..span.offset]);
        let covered: String = chars[span.range()].iter().collect();
        let name = styles.name(span.style).unwrap_or("?");
        let _ = write!(out, "[{name}|{covered}]");
        at = span.end();
    }
    out.extend(&chars[at..]);
    out
}

fn render(highlighter: &IncrementalHighlighter, doc: &RopeDocument) -> String {
    (0..doc.block_count())
        .map(|index| {
            let text = doc.block_text(index).unwrap_or_default();
            render_line(&text, highlighter.spans_for(index), highlighter.styles())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn e2e_python_file_highlighting() {
    init_logging();
    let span = span!(Level::INFO, "e2e_python_file");
    let _enter = span.enter();

    let doc = RopeDocument::from_str(SAMPLE_PY);
    let mut highlighter = IncrementalHighlighter::with_options(
        Arc::new(RuleTokenizer::python()),
        options(8),
    );

    let start = Instant::now();
    highlighter.request_full_rehighlight(&doc);
    let passes = highlighter.drain(&doc);
    info!(passes, elapsed = ?start.elapsed(), "initial highlighting complete");

    assert_eq!(passes, doc.block_count().div_ceil(8));
    assert_eq!(highlighter.pending_dirty_count(), 0);
    assert_eq!(highlighter.modified_count(), doc.block_count());

    for index in 0..doc.block_count() {
        let text = doc.block_text(index).unwrap_or_default();
        let spans = highlighter.spans_for(index);
        debug!(line = index, span_count = spans.len(), "line highlighted");
        assert_spans_well_formed(spans, text.chars().count());
    }

    let styles = highlighter.styles();
    let comment = styles.id("comment").unwrap();
    let class = styles.id("class").unwrap();
    assert_eq!(highlighter.spans_for(0), &[Span::new(0, 47, comment)]);
    assert_eq!(highlighter.spans_for(5), &[Span::new(0, 15, class)]);
    assert!(highlighter.spans_for(3).is_empty());
}

#[test]
fn e2e_rendered_snippet() {
    init_logging();
    let doc = RopeDocument::from_str("def greet(name):\n    # say hi\n    return 'hi ' + name * 2");
    let mut highlighter = IncrementalHighlighter::python();
    highlighter.request_full_rehighlight(&doc);
    highlighter.drain(&doc);

    insta::assert_snapshot!(render(&highlighter, &doc), @r"
[function|def greet](name):
    [comment|# say hi]
    [keyword|return] [string|'hi '] + name * [number|2]
");
}

#[test]
fn e2e_editing_session_stays_consistent() {
    init_logging();
    let span = span!(Level::INFO, "e2e_editing_session");
    let _enter = span.enter();

    let mut doc = RopeDocument::from_str(SAMPLE_PY);
    let mut highlighter = IncrementalHighlighter::with_options(
        Arc::new(RuleTokenizer::python()),
        options(4),
    );
    highlighter.request_full_rehighlight(&doc);
    highlighter.drain(&doc);
    let class_spans = highlighter.spans_for(5).to_vec();

    // New import above the class: two blocks dirty, the class line shifts.
    let edit = doc.insert(0, "import sys\n");
    highlighter.on_edit(&doc, edit);
    assert_eq!(highlighter.pending_dirty_count(), 2);
    assert_eq!(highlighter.spans_for(6), class_spans.as_slice());
    highlighter.drain(&doc);
    assert_matches_fresh(&highlighter, &doc);

    // Join two lines by deleting the line break between them.
    let join_at = doc.line_to_char(2) - 1;
    let edit = doc.remove(join_at..join_at + 1);
    highlighter.on_edit(&doc, edit);
    assert_eq!(highlighter.pending_dirty_count(), 1);
    highlighter.drain(&doc);
    assert_matches_fresh(&highlighter, &doc);

    // Rename a keyword so it stops matching.
    let line = doc.line(5).unwrap_or_default();
    let column = line.find("class").unwrap();
    let at = doc.line_to_char(5) + column;
    let edit = doc.replace(at..at + 5, "klass");
    highlighter.on_edit(&doc, edit);
    highlighter.drain(&doc);
    assert_matches_fresh(&highlighter, &doc);

    // Paste several lines in the middle of a block.
    let at = doc.line_to_char(10) + 4;
    let edit = doc.insert(at, "x = 1\n    y = 'two'\n    ");
    highlighter.on_edit(&doc, edit);
    assert_eq!(highlighter.pending_dirty_count(), 3);
    highlighter.drain(&doc);
    assert_matches_fresh(&highlighter, &doc);

    // Remove a whole range of lines.
    let start = doc.line_to_char(3);
    let end = doc.line_to_char(9);
    let edit = doc.remove(start..end);
    highlighter.on_edit(&doc, edit);
    highlighter.drain(&doc);
    assert_matches_fresh(&highlighter, &doc);
    assert!(highlighter.is_idle());
}

#[test]
fn e2e_debounce_collapses_edit_burst() {
    init_logging();
    let mut doc = RopeDocument::from_str("a = 1\nb = 2\nc = 3");
    let mut highlighter = IncrementalHighlighter::python();
    highlighter.request_full_rehighlight(&doc);
    highlighter.drain(&doc);

    let edit = doc.insert(0, "if ");
    highlighter.on_edit(&doc, edit);
    let deadline = highlighter.next_deadline().unwrap();

    let edit = doc.append(" or 4");
    highlighter.on_edit(&doc, edit);
    assert_eq!(highlighter.next_deadline(), Some(deadline));

    assert!(
        highlighter
            .on_tick(&doc, deadline - Duration::from_millis(1))
            .is_none()
    );
    let report = highlighter.on_tick(&doc, deadline).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.remaining, 0);
    assert!(highlighter.next_deadline().is_none());
    assert_matches_fresh(&highlighter, &doc);
}

#[test]
fn e2e_events_report_changed_blocks() {
    init_logging();
    let mut doc = RopeDocument::from_str(SAMPLE_PY);
    let mut highlighter = IncrementalHighlighter::python();
    highlighter.request_full_rehighlight(&doc);
    highlighter.drain(&doc);

    let rx = highlighter.subscribe_channel();
    let at = doc.line_to_char(1);
    let edit = doc.insert(at, "# ");
    highlighter.on_edit(&doc, edit);
    highlighter.drain(&doc);

    let events: Vec<HighlightEvent> = rx.try_iter().collect();
    let changed: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            HighlightEvent::BlockHighlighted { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(changed, vec![1]);
    assert!(matches!(events.last(), Some(HighlightEvent::PassFinished(_))));
}

#[test]
fn e2e_large_document_respects_batch_size() {
    init_logging();
    let mut text = String::new();
    for i in 0..10_000 {
        let _ = writeln!(text, "value_{i} = {i}  # entry");
    }
    let doc = RopeDocument::from_str(&text);
    let mut highlighter = IncrementalHighlighter::python();
    highlighter.request_full_rehighlight(&doc);

    let start = Instant::now();
    let mut passes = 0;
    while highlighter.pending_dirty_count() > 0 {
        let report = highlighter.run_batch(&doc);
        assert!(report.processed >= 1);
        assert!(report.processed <= 50);
        passes += 1;
    }
    info!(passes, elapsed = ?start.elapsed(), "large document drained");
    assert!(passes >= doc.block_count().div_ceil(50));
    assert!(highlighter.is_idle());
}

#[test]
fn e2e_registry_selects_python() {
    init_logging();
    let registry = TokenizerRegistry::with_builtins();
    let tokenizer = registry.for_extension("py").unwrap();
    assert_eq!(tokenizer.name(), "Python");
    assert!(registry.for_extension("pyw").is_some());
    assert!(registry.for_extension("rs").is_none());

    let doc = RopeDocument::from_str(SAMPLE_PY);
    let mut highlighter = IncrementalHighlighter::new(tokenizer);
    highlighter.request_full_rehighlight(&doc);
    highlighter.drain(&doc);
    assert_matches_fresh(&highlighter, &doc);
}
