//! Incremental, block-oriented syntax highlighting.
//!
//! A document is a sequence of blocks (lines). Each block is tokenized on its
//! own by a [`Tokenizer`], and only blocks marked dirty by edits are redone.
//! Work is batched by the [`Scheduler`] so a large rehighlight never blocks
//! the host for longer than the configured budget.
//!
//! Key types:
//!
//! - [`RuleSet`] / [`RuleTokenizer`]: ordered regex rules, last match wins
//! - [`DirtyTracker`]: maps edits to dirty blocks under stable [`BlockId`]s
//! - [`Scheduler`]: debounced, bounded passes over the dirty set
//! - [`IncrementalHighlighter`]: all of the above for one document

mod blocks;
mod dirty;
mod highlighter;
mod options;
mod rules;
mod scheduler;
mod span;
mod styles;
pub mod tokenizer;

pub use blocks::{BlockId, BlockStore, BlockTable};
pub use dirty::{DirtyTracker, MarkOutcome};
pub use highlighter::IncrementalHighlighter;
pub use options::{
    DEFAULT_BATCH_SIZE, DEFAULT_DEBOUNCE, DEFAULT_MAX_HIGHLIGHT_TIME, HighlighterOptions,
};
pub use rules::{PYTHON_KEYWORDS, Rule, RuleSet};
pub use scheduler::{
    BatchReport, BlockOutcome, Clock, Scheduler, SchedulerState, StopReason, SystemClock,
};
pub use span::{Span, StyleId};
pub use styles::StyleTable;
pub use tokenizer::{RuleTokenizer, Tokenizer, TokenizerRegistry, tokenize_with};
