//! Stable block identity and per-block span storage.
//!
//! Hosts address blocks by position, which shifts whenever blocks are
//! inserted or removed above. [`BlockTable`] assigns each observed block a
//! [`BlockId`] that survives such shifts; dirty state and stored spans are
//! keyed by id and translated to positions only at the API boundary.

use std::collections::HashMap;
use std::fmt;

use super::span::Span;

/// Stable handle for a block, unique for the lifetime of a [`BlockTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u64);

impl BlockId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// Positional order of block ids.
#[derive(Clone, Debug, Default)]
pub struct BlockTable {
    order: Vec<BlockId>,
    next_id: u64,
}

impl BlockTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table tracking `count` fresh blocks.
    #[must_use]
    pub fn with_len(count: usize) -> Self {
        let mut table = Self::new();
        table.resize(count);
        table
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Id of the block at `index`.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<BlockId> {
        self.order.get(index).copied()
    }

    /// Iterate `(index, id)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, BlockId)> + '_ {
        self.order.iter().copied().enumerate()
    }

    fn fresh(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Grow or shrink at the end to track exactly `count` blocks.
    ///
    /// Returns the ids that were retired.
    pub fn resize(&mut self, count: usize) -> Vec<BlockId> {
        if count <= self.order.len() {
            return self.order.split_off(count);
        }
        while self.order.len() < count {
            let id = self.fresh();
            self.order.push(id);
        }
        Vec::new()
    }

    /// Reconcile with a new block count after an edit inside block `anchor`.
    ///
    /// Growth inserts fresh ids right after `anchor`; shrinkage retires the
    /// ids right after it. Blocks before `anchor` and after the edited region
    /// keep their ids. Returns the retired ids.
    pub fn splice_after(&mut self, anchor: usize, count: usize) -> Vec<BlockId> {
        let current = self.order.len();
        if current == 0 || anchor >= current {
            return self.resize(count);
        }
        let at = anchor + 1;
        if count > current {
            let fresh: Vec<BlockId> = (0..count - current).map(|_| self.fresh()).collect();
            self.order.splice(at..at, fresh);
            Vec::new()
        } else if count < current {
            let end = (at + (current - count)).min(current);
            let mut retired: Vec<BlockId> = self.order.drain(at..end).collect();
            // Removing more blocks than follow the anchor eats into the anchor.
            if self.order.len() > count {
                retired.extend(self.order.split_off(count));
            }
            retired
        } else {
            Vec::new()
        }
    }
}

/// Latest computed spans per block.
#[derive(Clone, Debug, Default)]
pub struct BlockStore {
    spans: HashMap<BlockId, Vec<Span>>,
}

impl BlockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&[Span]> {
        self.spans.get(&id).map(Vec::as_slice)
    }

    /// Store spans for `id`, returning whether they differ from the old ones.
    pub fn insert(&mut self, id: BlockId, spans: Vec<Span>) -> bool {
        match self.spans.get_mut(&id) {
            Some(existing) if *existing == spans => false,
            Some(existing) => {
                *existing = spans;
                true
            }
            None => {
                self.spans.insert(id, spans);
                true
            }
        }
    }

    pub fn remove(&mut self, id: BlockId) -> Option<Vec<Span>> {
        self.spans.remove(&id)
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
