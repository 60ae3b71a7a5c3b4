//! Host document seam.
//!
//! The highlighter never owns document text. Hosts implement [`Document`] so
//! the engine can resolve block text and map char positions to blocks, and
//! report each mutation as an [`Edit`].

use std::borrow::Cow;

/// Read access to a block-structured document.
pub trait Document {
    /// Number of blocks currently in the document (at least 1).
    fn block_count(&self) -> usize;

    /// Text of block `index` without its line terminator, or `None` if the
    /// index is no longer valid.
    fn block_text(&self, index: usize) -> Option<Cow<'_, str>>;

    /// Block containing the char position `char_pos`, clamped to
    /// `[0, block_count - 1]`.
    fn block_at(&self, char_pos: usize) -> usize;
}

/// One document mutation, in chars: `removed` chars at `position` were
/// replaced by `added` chars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edit {
    pub position: usize,
    pub removed: usize,
    pub added: usize,
}

impl Edit {
    #[must_use]
    pub fn new(position: usize, removed: usize, added: usize) -> Self {
        Self {
            position,
            removed,
            added,
        }
    }

    #[must_use]
    pub fn insert(position: usize, added: usize) -> Self {
        Self::new(position, 0, added)
    }

    #[must_use]
    pub fn remove(position: usize, removed: usize) -> Self {
        Self::new(position, removed, 0)
    }

    /// Char position one past the inserted text.
    #[must_use]
    pub fn added_end(&self) -> usize {
        self.position.saturating_add(self.added)
    }
}

impl<T: AsRef<str>> Document for [T] {
    fn block_count(&self) -> usize {
        self.len().max(1)
    }

    fn block_text(&self, index: usize) -> Option<Cow<'_, str>> {
        match self.get(index) {
            Some(line) => Some(Cow::Borrowed(line.as_ref())),
            None if index == 0 && self.is_empty() => Some(Cow::Borrowed("")),
            None => None,
        }
    }

    fn block_at(&self, char_pos: usize) -> usize {
        let mut start = 0usize;
        for (index, line) in self.iter().enumerate() {
            // Each block is followed by one separator char.
            let end = start + line.as_ref().chars().count();
            if char_pos <= end {
                return index;
            }
            start = end + 1;
        }
        self.len().saturating_sub(1)
    }
}
