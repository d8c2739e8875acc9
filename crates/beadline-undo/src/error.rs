#![forbid(unsafe_code)]

//! Error types for the undo engine.

use beadline_outline::OutlineError;
use thiserror::Error;

/// Errors raised while recording or replaying beads.
///
/// A failed undo or redo leaves the bead cursor where it was.
#[derive(Debug, Error)]
pub enum UndoError {
    /// Recorded data no longer matches the document.
    #[error("internal inconsistency in {context}: {detail}")]
    InternalInconsistency {
        context: &'static str,
        detail: String,
    },

    /// `after_change_group` found no open group on top of the stack.
    #[error("no open group to close (top bead: {found})")]
    MismatchedGroup { found: String },

    #[error("undo stack is empty")]
    EmptyStack,

    #[error("document has no current position")]
    NoCurrentPosition,

    #[error(transparent)]
    Outline(#[from] OutlineError),
}

impl UndoError {
    #[must_use]
    pub fn inconsistency(context: &'static str, detail: impl Into<String>) -> Self {
        Self::InternalInconsistency {
            context,
            detail: detail.into(),
        }
    }
}

/// Convenience result alias for undo operations.
pub type Result<T> = std::result::Result<T, UndoError>;

/// Errors loading an [`UndoConfig`](crate::UndoConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
