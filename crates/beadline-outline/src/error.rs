#![forbid(unsafe_code)]

//! Error types for outline operations.

use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by link primitives and outline commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutlineError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("child index {index} out of range for {parent:?} ({len} children)")]
    ChildIndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },

    #[error("link mismatch: child {index} of {parent:?} is not {child:?}")]
    LinkMismatch {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },

    #[error("position does not exist in the outline")]
    NoPosition,

    #[error("invalid outline state: {0}")]
    InvalidState(String),
}

impl OutlineError {
    #[must_use]
    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::InvalidState(detail.into())
    }
}

/// Convenience result alias for outline operations.
pub type Result<T> = std::result::Result<T, OutlineError>;
