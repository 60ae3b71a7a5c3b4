//! Host document access.
//!
//! The highlighter reads text through the [`Document`] trait and is told
//! about changes with [`Edit`] values. [`RopeDocument`] is a ready-made
//! rope-backed implementation.
//!
//! # Examples
//!
//! ```
//! use blocklight::text::{Document, RopeDocument};
//!
//! let mut doc = RopeDocument::from_str("first\nsecond");
//! let edit = doc.insert(5, " line");
//! assert_eq!(edit.added, 5);
//! assert_eq!(doc.block_count(), 2);
//! assert_eq!(doc.block_text(0).as_deref(), Some("first line"));
//! ```

mod document;
mod rope;

pub use document::{Document, Edit};
pub use rope::RopeDocument;
