//! Error types for the tree index.

use std::path::PathBuf;

/// Result type alias for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Errors that can occur while mutating or querying the tree.
///
/// Every variant is recoverable: an operation that returns an error has left
/// the index exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// An id does not resolve to a record.
    #[error("No tree item with id '{id}'")]
    NotFound { id: String },

    /// A move would make a node its own ancestor.
    #[error("Cannot move '{id}' under '{target}': target is the node itself or one of its descendants")]
    CycleRejected { id: String, target: String },

    /// The operation would not change anything.
    #[error("Operation rejected as a no-op: {reason}")]
    NoOpRejected { reason: String },

    /// The index was found in a state that breaks parent linkage.
    #[error("Tree invariant violated: {message}")]
    InvariantViolation { message: String },

    /// Configuration could not be parsed.
    #[error("Invalid tree configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A tree description could not be parsed.
    #[error("Invalid tree description: {0}")]
    Description(#[from] serde_json::Error),

    /// File I/O error.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TreeError {
    /// Create a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a cycle error.
    pub fn cycle(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self::CycleRejected {
            id: id.into(),
            target: target.into(),
        }
    }

    /// Create a no-op rejection.
    pub fn no_op(reason: impl Into<String>) -> Self {
        Self::NoOpRejected {
            reason: reason.into(),
        }
    }

    /// Create an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for rejections that callers usually ignore silently.
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::NoOpRejected { .. })
    }
}
