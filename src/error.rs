//! Error types for blocklight.

use std::fmt;

/// Result type alias for blocklight operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for blocklight operations.
#[derive(Debug)]
pub enum Error {
    /// A highlighting rule's pattern failed to compile.
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    /// A style name was looked up that no rule registered.
    UnknownStyle(String),
    /// Block index outside `[0, block_count)`.
    InvalidBlock { index: usize, block_count: usize },
    /// A configuration value below its documented minimum.
    InvalidSetting { name: &'static str, value: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, source } => {
                write!(f, "invalid rule pattern {pattern:?}: {source}")
            }
            Self::UnknownStyle(name) => write!(f, "unknown style: {name}"),
            Self::InvalidBlock { index, block_count } => {
                write!(
                    f,
                    "block {index} out of range for document with {block_count} blocks"
                )
            }
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid value for {name}: {value}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}
