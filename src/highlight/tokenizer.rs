//! Block tokenization.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::rules::RuleSet;
use super::span::{Span, StyleId};
use super::styles::StyleTable;

/// Core tokenizer abstraction for syntax highlighting.
///
/// Implementations must be pure: the same text always yields the same spans,
/// so blocks can be tokenized in any order or in parallel.
pub trait Tokenizer: Send + Sync {
    /// Human-readable name of this tokenizer.
    fn name(&self) -> &'static str;

    /// File extensions this tokenizer handles (e.g., `py`).
    fn extensions(&self) -> &'static [&'static str];

    /// Style names used in the spans this tokenizer produces.
    fn styles(&self) -> &StyleTable;

    /// Tokenize the text of a single block.
    ///
    /// Spans are sorted by offset, non-overlapping, and measured in chars.
    fn tokenize_block(&self, text: &str) -> Vec<Span>;

    /// Tokenize a whole text, one span list per line.
    ///
    /// Accepts LF and CRLF line endings; terminators are never part of a line.
    fn tokenize(&self, text: &str) -> Vec<Vec<Span>> {
        text.lines()
            .map(|line| self.tokenize_block(line.trim_end_matches('\r')))
            .collect()
    }
}

/// Tokenizer applying a [`RuleSet`] with last-writer-wins overlap resolution.
#[derive(Clone, Debug)]
pub struct RuleTokenizer {
    name: &'static str,
    extensions: &'static [&'static str],
    rules: RuleSet,
}

impl RuleTokenizer {
    #[must_use]
    pub fn new(name: &'static str, extensions: &'static [&'static str], rules: RuleSet) -> Self {
        Self {
            name,
            extensions,
            rules,
        }
    }

    /// Tokenizer for Python source using [`RuleSet::python`].
    #[must_use]
    pub fn python() -> Self {
        Self::new("Python", &["py", "pyw", "pyi"], RuleSet::python())
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Tokenizer for RuleTokenizer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn styles(&self) -> &StyleTable {
        self.rules.styles()
    }

    fn tokenize_block(&self, text: &str) -> Vec<Span> {
        tokenize_with(&self.rules, text)
    }
}

/// Apply `rules` to `text` and run-length encode the resulting style buffer.
///
/// Each rule writes every non-overlapping, non-empty match into a per-char
/// buffer in registration order, so later rules clobber earlier ones.
#[must_use]
pub fn tokenize_with(rules: &RuleSet, text: &str) -> Vec<Span> {
    if text.is_empty() || rules.is_empty() {
        return Vec::new();
    }

    let byte_to_char = CharIndex::new(text);
    let mut styles: Vec<Option<StyleId>> = vec![None; byte_to_char.char_len()];

    for rule in rules.rules() {
        for found in rule.pattern().find_iter(text) {
            if found.is_empty() {
                continue;
            }
            let start = byte_to_char.char_at(found.start());
            let end = byte_to_char.char_at(found.end());
            styles[start..end].fill(Some(rule.style()));
        }
    }

    let spans = run_length_encode(&styles);
    trace!(chars = styles.len(), spans = spans.len(), "tokenized block");
    spans
}

fn run_length_encode(styles: &[Option<StyleId>]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, StyleId)> = None;

    for (i, style) in styles.iter().copied().enumerate() {
        match (current, style) {
            (Some((_, open)), Some(next)) if open == next => {}
            (Some((start, open)), next) => {
                spans.push(Span::new(start, i - start, open));
                current = next.map(|s| (i, s));
            }
            (None, next) => current = next.map(|s| (i, s)),
        }
    }
    if let Some((start, open)) = current {
        spans.push(Span::new(start, styles.len() - start, open));
    }
    spans
}

/// Byte offset to char offset translation for one block.
enum CharIndex {
    Ascii(usize),
    Mapped { chars: usize, starts: Vec<usize> },
}

impl CharIndex {
    fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self::Ascii(text.len());
        }
        let starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        Self::Mapped {
            chars: starts.len(),
            starts,
        }
    }

    fn char_len(&self) -> usize {
        match self {
            Self::Ascii(len) => *len,
            Self::Mapped { chars, .. } => *chars,
        }
    }

    // Regex match bounds always fall on char boundaries.
    fn char_at(&self, byte: usize) -> usize {
        match self {
            Self::Ascii(_) => byte,
            Self::Mapped { chars, starts } => starts.binary_search(&byte).unwrap_or(*chars),
        }
    }
}

/// Registry for tokenizer lookup by extension or name.
#[derive(Default)]
pub struct TokenizerRegistry {
    tokenizers: Vec<Arc<dyn Tokenizer>>,
    by_extension: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl TokenizerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tokenizer. Later registrations override existing lookups.
    pub fn register(&mut self, tokenizer: Arc<dyn Tokenizer>) {
        let index = self.tokenizers.len();
        self.by_name
            .insert(tokenizer.name().to_ascii_lowercase(), index);

        for ext in tokenizer.extensions() {
            let key = ext.trim_start_matches('.').to_ascii_lowercase();
            if !key.is_empty() {
                self.by_extension.insert(key, index);
            }
        }

        self.tokenizers.push(tokenizer);
    }

    /// Get tokenizer by file extension (case-insensitive, with or without dot).
    #[must_use]
    pub fn for_extension(&self, ext: &str) -> Option<Arc<dyn Tokenizer>> {
        let key = ext.trim_start_matches('.').to_ascii_lowercase();
        let index = self.by_extension.get(&key)?;
        self.tokenizers.get(*index).cloned()
    }

    /// Get tokenizer by name (case-insensitive).
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn Tokenizer>> {
        let index = self.by_name.get(&name.to_ascii_lowercase())?;
        self.tokenizers.get(*index).cloned()
    }

    /// Create registry with all built-in tokenizers.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RuleTokenizer::python()));
        registry
    }
}
