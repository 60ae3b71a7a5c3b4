//! Styled span types produced by tokenization.

use std::fmt;
use std::ops::Range;

/// Opaque handle for a style tag such as `keyword` or `comment`.
///
/// Ids are handed out by a [`StyleTable`](super::StyleTable); the table maps
/// them back to their names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub(crate) u32);

impl StyleId {
    /// Raw numeric value of this id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "style#{}", self.0)
    }
}

/// One contiguous styled region within a block.
///
/// `offset` and `len` count chars of the block text, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    pub style: StyleId,
}

impl Span {
    #[must_use]
    pub fn new(offset: usize, len: usize, style: StyleId) -> Self {
        Self { offset, len, style }
    }

    /// Char index one past the end of the span.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Slice of `text` covered by this span, if the range is valid for it.
    #[must_use]
    pub fn text<'a>(&self, text: &'a str) -> Option<&'a str> {
        let mut indices = text.char_indices().map(|(i, _)| i).chain([text.len()]);
        let start = indices.nth(self.offset)?;
        let end = if self.len == 0 {
            start
        } else {
            indices.nth(self.len - 1)?
        };
        text.get(start..end)
    }
}
