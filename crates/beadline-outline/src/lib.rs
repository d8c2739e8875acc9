#![forbid(unsafe_code)]

//! Outline document model for beadline.
//!
//! An outline is a DAG of shared [`Vnode`]s. A [`Position`] names one
//! occurrence of a vnode by its path of child indices from the hidden root.
//! The [`Document`] trait is the seam the undo engine drives; [`Outline`] is
//! the in-memory implementation.
//!
//! ```text
//! hidden root
//! ├── A            Position { v: A, child_index: 0, stack: [] }
//! │   └── B        Position { v: B, child_index: 0, stack: [(A, 0)] }
//! └── B (clone)    Position { v: B, child_index: 1, stack: [] }
//! ```

pub mod document;
pub mod error;
pub mod node;
pub mod outline;
pub mod position;

pub use document::{
    CLONES_CONTAINER, COPIES_CONTAINER, Document, MOVED_CONTAINER, MovedMarked, Selection,
};
pub use error::{OutlineError, Result};
pub use node::{NodeId, StatusBits, UnknownAttributes, Vnode, is_at_file_headline};
pub use outline::Outline;
pub use position::Position;
