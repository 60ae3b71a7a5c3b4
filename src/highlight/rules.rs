//! Ordered pattern-to-style rules.

use regex::Regex;
use tracing::warn;

use super::span::StyleId;
use super::styles::StyleTable;
use crate::error::{Error, Result};

/// Keywords styled by [`RuleSet::python`].
pub const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "break", "class", "continue", "def", "del", "elif", "else", "except",
    "False", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "None",
    "nonlocal", "not", "or", "pass", "raise", "return", "True", "try", "while", "with", "yield",
];

/// A compiled pattern and the style written over each of its matches.
#[derive(Clone, Debug)]
pub struct Rule {
    pattern: Regex,
    style: StyleId,
}

impl Rule {
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    #[must_use]
    pub fn style(&self) -> StyleId {
        self.style
    }
}

/// Rules in registration order.
///
/// Order is priority: where matches of two rules overlap, the rule
/// registered later owns the overlapping characters.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    styles: StyleTable,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and append it with the given style name.
    ///
    /// A pattern that fails to compile leaves the set unchanged.
    pub fn add(&mut self, pattern: &str, style: &str) -> Result<StyleId> {
        let compiled = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let style = self.styles.intern(style);
        self.rules.push(Rule {
            pattern: compiled,
            style,
        });
        Ok(style)
    }

    /// Append a rule, logging and skipping it if the pattern is invalid.
    ///
    /// Returns whether the rule was added.
    pub fn add_or_skip(&mut self, pattern: &str, style: &str) -> bool {
        match self.add(pattern, style) {
            Ok(_) => true,
            Err(err) => {
                warn!(%pattern, %style, error = %err, "skipping highlighting rule");
                false
            }
        }
    }

    /// Build a set from `(pattern, style)` pairs, skipping invalid patterns.
    #[must_use]
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = Self::new();
        for (pattern, style) in pairs {
            set.add_or_skip(pattern, style);
        }
        set
    }

    /// Python rules: keywords, class and function headers, strings,
    /// comments and integer literals.
    #[must_use]
    pub fn python() -> Self {
        let mut set = Self::new();
        for keyword in PYTHON_KEYWORDS {
            set.add_or_skip(&format!(r"\b{keyword}\b"), "keyword");
        }
        set.add_or_skip(r"\bclass\b\s*(\w+)", "class");
        set.add_or_skip(r"\bdef\b\s*(\w+)", "function");
        set.add_or_skip(r"'[^']*'", "string");
        set.add_or_skip(r#""[^"]*""#, "string");
        set.add_or_skip(r"#[^\n]*", "comment");
        set.add_or_skip(r"\b[0-9]+\b", "number");
        set
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Style id for a name used by one of the rules.
    #[must_use]
    pub fn style(&self, name: &str) -> Option<StyleId> {
        self.styles.id(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
