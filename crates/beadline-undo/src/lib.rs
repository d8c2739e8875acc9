#![forbid(unsafe_code)]

//! Unlimited undo/redo for beadline outlines.
//!
//! Every undoable command records a [`Bead`] on a linear history. Undo
//! replays the bead at the cursor backwards; redo replays the next one
//! forwards. Compound commands record a group bead whose items replay as
//! one step, and consecutive keystrokes are compressed into typing beads
//! according to the configured [`Granularity`].
//!
//! ```text
//! command ──before_*──> pending data ──after_*──> Bead ──> BeadStack
//!                                                            │
//!                          Document <──replay_bead── undo/redo
//! ```
//!
//! The engine drives any [`beadline_outline::Document`].

pub mod bead;
pub mod config;
pub mod error;
pub mod pending;
mod replay;
pub mod stack;
pub mod text;
pub mod tree;
pub mod typing;
pub mod undoer;

pub use bead::{Bead, BeadKind, GroupChange, GroupState, NodeText, TypingChange};
pub use config::UndoConfig;
pub use error::{ConfigError, Result, UndoError};
pub use pending::{
    CloneUndoData, CommonData, DeleteUndoData, InsertUndoData, MarkUndoData, MoveUndoData,
    NodeUndoData, RecentFilesUndoData, SortUndoData, TreeUndoData,
};
pub use replay::Direction;
pub use stack::BeadStack;
pub use text::LineDiff;
pub use tree::{TreeSnapshot, restore_tree, save_tree};
pub use typing::{Granularity, Keystroke, WhitespaceBoundary, WordBoundary};
pub use undoer::{
    CANT_REDO, CANT_UNDO, ReplayOutcome, ReplayState, TYPING, TypingEdit, Undoer, redo_menu_name,
    undo_menu_name,
};
