//! Edit-to-dirty-block tracking.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use tracing::trace;

use super::blocks::{BlockId, BlockTable};
use crate::text::{Document, Edit};

/// Blocks affected by one marking operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkOutcome {
    /// Positional range that was marked dirty, if any.
    pub marked: Option<RangeInclusive<usize>>,
    /// Ids that no longer exist after reconciling with the document.
    pub retired: Vec<BlockId>,
}

/// Tracks which blocks need re-tokenization and which have ever been
/// tokenized.
///
/// Both sets are keyed by [`BlockId`], so they stay attached to their blocks
/// when other blocks are inserted or removed above them. The tracker only
/// records work; running it is the scheduler's job.
#[derive(Clone, Debug, Default)]
pub struct DirtyTracker {
    table: BlockTable,
    dirty: HashSet<BlockId>,
    modified: HashSet<BlockId>,
}

impl DirtyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker for a document with `block_count` blocks, all clean.
    #[must_use]
    pub fn with_block_count(block_count: usize) -> Self {
        Self {
            table: BlockTable::with_len(block_count),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn table(&self) -> &BlockTable {
        &self.table
    }

    /// Map an already-applied host edit to dirty blocks.
    ///
    /// Marks every block in `[block_at(position), block_at(position + added)]`,
    /// widened to cover any blocks the edit added.
    pub fn on_edit(&mut self, doc: &dyn Document, edit: Edit) -> MarkOutcome {
        let block_count = doc.block_count();
        let last_valid = block_count.saturating_sub(1);
        let first = doc.block_at(edit.position).min(last_valid);
        // Blocks created by the splice have no spans yet.
        let grown = block_count.saturating_sub(self.table.len());
        let last = doc
            .block_at(edit.added_end())
            .max(first + grown)
            .clamp(first, last_valid);

        let retired = if self.table.len() == block_count {
            Vec::new()
        } else {
            self.table.splice_after(first, block_count)
        };
        self.forget(&retired);

        for index in first..=last {
            self.mark_index(index);
        }
        trace!(
            position = edit.position,
            removed = edit.removed,
            added = edit.added,
            first,
            last,
            retired = retired.len(),
            "edit marked blocks dirty"
        );
        MarkOutcome {
            marked: Some(first..=last),
            retired,
        }
    }

    /// Mark every block of a document with `block_count` blocks dirty.
    pub fn mark_all(&mut self, block_count: usize) -> MarkOutcome {
        let retired = self.sync_block_count(block_count);
        self.dirty.extend(self.table.iter().map(|(_, id)| id));
        MarkOutcome {
            marked: block_count.checked_sub(1).map(|last| 0..=last),
            retired,
        }
    }

    /// Mark a single block dirty. Out-of-range indices are ignored.
    pub fn mark_one(&mut self, index: usize) -> bool {
        self.mark_index(index)
    }

    /// Reconcile with a block count reported without an edit, growing or
    /// truncating at the end.
    pub fn sync_block_count(&mut self, block_count: usize) -> Vec<BlockId> {
        if self.table.len() == block_count {
            return Vec::new();
        }
        let retired = self.table.resize(block_count);
        self.forget(&retired);
        retired
    }

    fn mark_index(&mut self, index: usize) -> bool {
        match self.table.id_at(index) {
            Some(id) => {
                self.dirty.insert(id);
                true
            }
            None => false,
        }
    }

    fn forget(&mut self, retired: &[BlockId]) {
        for id in retired {
            self.dirty.remove(id);
            self.modified.remove(id);
        }
    }

    /// Dirty blocks in ascending positional order.
    #[must_use]
    pub fn dirty_snapshot(&self) -> Vec<(usize, BlockId)> {
        if self.dirty.is_empty() {
            return Vec::new();
        }
        self.table
            .iter()
            .filter(|(_, id)| self.dirty.contains(id))
            .collect()
    }

    #[must_use]
    pub fn is_dirty(&self, index: usize) -> bool {
        self.table
            .id_at(index)
            .is_some_and(|id| self.dirty.contains(&id))
    }

    /// Record a block as tokenized: clean it and add it to the modified ledger.
    pub fn complete(&mut self, id: BlockId) {
        self.dirty.remove(&id);
        self.modified.insert(id);
    }

    /// Drop a block the host reported invalid.
    pub fn discard(&mut self, id: BlockId) {
        self.dirty.remove(&id);
    }

    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    #[must_use]
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[must_use]
    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    #[must_use]
    pub fn is_modified(&self, index: usize) -> bool {
        self.table
            .id_at(index)
            .is_some_and(|id| self.modified.contains(&id))
    }

    pub fn clear_modified(&mut self) {
        self.modified.clear();
    }
}
