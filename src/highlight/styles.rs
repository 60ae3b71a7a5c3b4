//! Style tag interning.

use std::collections::HashMap;

use super::span::StyleId;

/// Registry of style tag names.
///
/// Rules refer to styles by name; spans carry the interned [`StyleId`] so the
/// per-character buffer used during tokenization stays `Copy`.
#[derive(Clone, Debug, Default)]
pub struct StyleTable {
    names: Vec<String>,
    by_name: HashMap<String, StyleId>,
}

impl StyleTable {
    /// Create a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a style name, returning the existing id if already known.
    pub fn intern(&mut self, name: &str) -> StyleId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = StyleId(u32::try_from(self.names.len()).unwrap_or(u32::MAX));
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Get the id for a name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<StyleId> {
        self.by_name.get(name).copied()
    }

    /// Get the name for an id.
    #[must_use]
    pub fn name(&self, id: StyleId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Get the id for a name, or an [`Error::UnknownStyle`](crate::Error::UnknownStyle).
    pub fn require(&self, name: &str) -> crate::Result<StyleId> {
        self.id(name)
            .ok_or_else(|| crate::Error::UnknownStyle(name.to_string()))
    }

    /// Number of interned styles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over all styles in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleId, &str)> {
        self.names
            .iter()
            .zip(0u32..)
            .map(|(name, i)| (StyleId(i), name.as_str()))
    }
}
