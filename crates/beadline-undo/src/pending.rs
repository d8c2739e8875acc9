#![forbid(unsafe_code)]

//! State captured by `before_*` calls and consumed by the matching `after_*`.
//!
//! Each operation has its own type, so an `after_*` call can only be fed
//! data from its own `before_*`.

use beadline_outline::{Document, NodeId, Position, Selection};

use crate::bead::NodeText;
use crate::tree::TreeSnapshot;

/// Fields every bead records before its operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonData {
    pub(crate) p: Position,
    pub(crate) old_marked: bool,
    pub(crate) old_sel: Option<Selection>,
    pub(crate) old_y_scroll: i32,
    /// @file ancestors that were clean before the operation.
    pub(crate) dirty: Vec<NodeId>,
}

impl CommonData {
    pub(crate) fn capture<D: Document + ?Sized>(doc: &D, p: &Position) -> Self {
        Self {
            p: p.clone(),
            old_marked: doc.is_marked(p.v()),
            old_sel: Some(doc.selection()),
            old_y_scroll: doc.y_scroll(),
            dirty: clean_at_file_ancestors(doc, p.v()),
        }
    }

    /// The position the operation applies to.
    #[must_use]
    pub fn p(&self) -> &Position {
        &self.p
    }
}

pub(crate) fn clean_at_file_ancestors<D: Document + ?Sized>(doc: &D, v: NodeId) -> Vec<NodeId> {
    doc.at_file_ancestors(v)
        .into_iter()
        .filter(|&a| !doc.is_dirty(a))
        .collect()
}

pub(crate) fn node_text<D: Document + ?Sized>(doc: &D, v: NodeId) -> NodeText {
    NodeText {
        v,
        head: doc.head(v).to_string(),
        body: doc.body(v).to_string(),
    }
}

/// Before-state for node, body, and headline changes.
#[derive(Debug, Clone)]
pub struct NodeUndoData {
    pub(crate) common: CommonData,
    pub(crate) old_head: String,
    pub(crate) old_body: String,
}

#[derive(Debug, Clone)]
pub struct TreeUndoData {
    pub(crate) common: CommonData,
    pub(crate) old_tree: TreeSnapshot,
}

#[derive(Debug, Clone)]
pub struct InsertUndoData {
    pub(crate) common: CommonData,
    /// Text of the pasted clones before the paste.
    pub(crate) paste_before: Option<Vec<NodeText>>,
}

#[derive(Debug, Clone)]
pub struct DeleteUndoData {
    pub(crate) common: CommonData,
    pub(crate) old_back: Option<Position>,
    pub(crate) old_parent: Option<Position>,
}

#[derive(Debug, Clone)]
pub struct MoveUndoData {
    pub(crate) common: CommonData,
    pub(crate) old_n: usize,
    pub(crate) old_parent_v: NodeId,
}

#[derive(Debug, Clone)]
pub struct CloneUndoData {
    pub(crate) common: CommonData,
}

#[derive(Debug, Clone)]
pub struct MarkUndoData {
    pub(crate) common: CommonData,
    pub(crate) undo_type: String,
}

#[derive(Debug, Clone)]
pub struct SortUndoData {
    pub(crate) common: CommonData,
    pub(crate) undo_type: String,
    pub(crate) old_children: Vec<NodeId>,
    pub(crate) new_children: Vec<NodeId>,
    pub(crate) sort_children: bool,
}

#[derive(Debug, Clone)]
pub struct RecentFilesUndoData {
    pub(crate) common: CommonData,
    pub(crate) old_files: Vec<String>,
}
