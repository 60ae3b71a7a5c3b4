//! `blocklight` - incremental syntax highlighting for line-structured text
//!
//! Regex rules tokenize one block (line) at a time. Edits mark only the
//! affected blocks dirty, and a debounced scheduler re-tokenizes them in
//! bounded batches so an editor stays responsive on large documents.
//!
//! ```
//! use blocklight::{IncrementalHighlighter, RopeDocument};
//!
//! let doc = RopeDocument::from_str("def f():  # x");
//! let mut highlighter = IncrementalHighlighter::python();
//! highlighter.request_full_rehighlight(&doc);
//! highlighter.drain(&doc);
//!
//! let styles = highlighter.styles();
//! let first = highlighter.spans_for(0)[0];
//! assert_eq!(styles.name(first.style), Some("function"));
//! ```

// Crate-level lint configuration
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)] // Allow highlight::HighlighterOptions etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::should_implement_trait)] // from_str naming is intentional
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine
#![allow(clippy::needless_collect)] // Collect for assertions is clear

pub mod error;
pub mod event;
pub mod highlight;
pub mod text;

pub use error::{Error, Result};
pub use event::{EventBus, HighlightEvent};
pub use highlight::{
    BatchReport, BlockId, HighlighterOptions, IncrementalHighlighter, RuleSet, RuleTokenizer,
    SchedulerState, Span, StopReason, StyleId, StyleTable, Tokenizer, TokenizerRegistry,
};
pub use text::{Document, Edit, RopeDocument};
