//! Rope-backed reference document using the ropey crate.

use std::borrow::Cow;
use std::ops::Range;

use ropey::Rope;

use super::document::{Document, Edit};

const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}',
];

/// A [`Document`] over a [`ropey::Rope`], one block per line.
///
/// Every mutating method returns the [`Edit`] describing it, ready to be
/// passed to the highlighter.
#[derive(Clone, Debug, Default)]
pub struct RopeDocument {
    rope: Rope,
}

impl RopeDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a document from a string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
        }
    }

    /// Get the number of characters.
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Get the number of lines.
    #[must_use]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Get a line by index, including its terminator.
    #[must_use]
    pub fn line(&self, idx: usize) -> Option<String> {
        self.rope.get_line(idx).map(|line| line.to_string())
    }

    /// Insert text at a character position (clamped to the end).
    pub fn insert(&mut self, char_idx: usize, text: &str) -> Edit {
        let position = char_idx.min(self.len_chars());
        self.rope.insert(position, text);
        Edit::insert(position, text.chars().count())
    }

    /// Remove a range of characters (clamped to the document).
    pub fn remove(&mut self, range: Range<usize>) -> Edit {
        let len = self.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.rope.remove(start..end);
        Edit::remove(start, end - start)
    }

    /// Replace a range of characters with `text`.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Edit {
        let removed = self.remove(range);
        self.rope.insert(removed.position, text);
        Edit::new(removed.position, removed.removed, text.chars().count())
    }

    /// Replace the entire contents.
    pub fn set_text(&mut self, text: &str) -> Edit {
        let removed = self.len_chars();
        self.rope = Rope::from_str(text);
        Edit::new(0, removed, self.len_chars())
    }

    /// Append text to the end.
    pub fn append(&mut self, text: &str) -> Edit {
        let len = self.len_chars();
        self.insert(len, text)
    }

    /// Get the char index at the start of a line.
    #[must_use]
    pub fn line_to_char(&self, line_idx: usize) -> usize {
        if line_idx >= self.len_lines() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line_idx)
        }
    }
}

impl std::fmt::Display for RopeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl Document for RopeDocument {
    fn block_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn block_text(&self, index: usize) -> Option<Cow<'_, str>> {
        let line = self.rope.get_line(index)?;
        let text: Cow<'_, str> = line.into();
        Some(match text {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim_end_matches(LINE_BREAKS)),
            Cow::Owned(s) => Cow::Owned(s.trim_end_matches(LINE_BREAKS).to_string()),
        })
    }

    fn block_at(&self, char_pos: usize) -> usize {
        self.rope.char_to_line(char_pos.min(self.len_chars()))
    }
}

impl From<&str> for RopeDocument {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for RopeDocument {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}
