#![forbid(unsafe_code)]

//! Beads: one undoable step each.
//!
//! Every bead carries the fields common to all operations (label, position,
//! marked flags, selection, dirty nodes) plus a [`BeadKind`] holding the
//! before/after data for its operation.

use beadline_outline::{NodeId, Position, Selection};
use serde::Serialize;

use crate::tree::TreeSnapshot;

/// One entry in the undo history.
#[derive(Debug, Clone, Serialize)]
pub struct Bead {
    /// Label shown in the Undo/Redo menu items.
    pub undo_type: String,
    /// Position the operation applied to.
    pub p: Position,
    pub old_marked: bool,
    pub new_marked: bool,
    pub old_sel: Option<Selection>,
    pub new_sel: Option<Selection>,
    /// Nodes whose dirty bit is set again on replay.
    pub dirty: Vec<NodeId>,
    pub kind: BeadKind,
}

impl Bead {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    #[must_use]
    pub fn is_open_group(&self) -> bool {
        matches!(&self.kind, BeadKind::Group(g) if g.state == GroupState::Open)
    }

    #[must_use]
    pub fn group(&self) -> Option<&GroupChange> {
        match &self.kind {
            BeadKind::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Number of leaf operations in this bead.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            BeadKind::Group(g) => g.items.iter().map(Self::leaf_count).sum(),
            _ => 1,
        }
    }
}

/// Per-operation data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BeadKind {
    Node(ContentChange),
    Body(ContentChange),
    Headline(HeadlineChange),
    Tree(TreeChange),
    Typing(TypingChange),
    Insert(InsertChange),
    Delete(DeleteChange),
    Move(MoveChange),
    Clone(CloneChange),
    Hoist,
    Dehoist,
    Mark,
    Sort(SortChange),
    Demote(DemoteChange),
    Promote(PromoteChange),
    ClearRecentFiles(RecentFilesChange),
    DeleteMarkedNodes(DeleteMarkedChange),
    MoveMarkedNodes(MoveMarkedChange),
    CloneMarkedNodes(MarkedContainerChange),
    CopyMarkedNodes(MarkedContainerChange),
    Group(GroupChange),
}

impl BeadKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Node(_) => "node",
            Self::Body(_) => "body",
            Self::Headline(_) => "headline",
            Self::Tree(_) => "tree",
            Self::Typing(_) => "typing",
            Self::Insert(_) => "insert",
            Self::Delete(_) => "delete",
            Self::Move(_) => "move",
            Self::Clone(_) => "clone",
            Self::Hoist => "hoist",
            Self::Dehoist => "dehoist",
            Self::Mark => "mark",
            Self::Sort(_) => "sort",
            Self::Demote(_) => "demote",
            Self::Promote(_) => "promote",
            Self::ClearRecentFiles(_) => "clear-recent-files",
            Self::DeleteMarkedNodes(_) => "delete-marked-nodes",
            Self::MoveMarkedNodes(_) => "move-marked-nodes",
            Self::CloneMarkedNodes(_) => "clone-marked-nodes",
            Self::CopyMarkedNodes(_) => "copy-marked-nodes",
            Self::Group(g) => match g.state {
                GroupState::Open => "beforeGroup",
                GroupState::Closed => "afterGroup",
            },
        }
    }
}

/// Headline, body, and scroll of a node before and after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentChange {
    pub old_head: String,
    pub old_body: String,
    pub old_y_scroll: i32,
    pub new_head: String,
    pub new_body: String,
    pub new_y_scroll: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadlineChange {
    pub old_head: String,
    pub new_head: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeChange {
    pub old_tree: TreeSnapshot,
    /// Filled in from the live document on first undo.
    pub new_tree: Option<TreeSnapshot>,
}

/// Compressed body edit. See [`crate::text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypingChange {
    pub leading: usize,
    pub trailing: usize,
    pub old_middle: Vec<String>,
    pub new_middle: Vec<String>,
    pub old_newlines: usize,
    pub new_newlines: usize,
    pub old_y_scroll: Option<i32>,
    pub new_y_scroll: Option<i32>,
}

/// Headline and body of a node, used around paste-as-clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeText {
    pub v: NodeId,
    pub head: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteAsClone {
    pub before: Vec<NodeText>,
    pub after: Vec<NodeText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertChange {
    pub new_p: Position,
    pub new_back: Option<Position>,
    pub new_parent: Option<Position>,
    pub paste_as_clone: Option<PasteAsClone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteChange {
    pub old_back: Option<Position>,
    pub old_parent: Option<Position>,
    /// Position selected after the delete.
    pub new_p: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveChange {
    pub old_n: usize,
    pub old_parent_v: NodeId,
    pub new_n: usize,
    pub new_parent_v: NodeId,
    pub new_p: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneChange {
    pub new_p: Position,
    pub new_back: Option<Position>,
    pub new_parent: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortChange {
    pub old_children: Vec<NodeId>,
    pub new_children: Vec<NodeId>,
    /// True when the children of `p`'s parent were sorted as a unit.
    pub sort_children: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoteChange {
    pub following_sibs: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoteChange {
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentFilesChange {
    pub old_files: Vec<String>,
    pub new_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteMarkedChange {
    /// Former positions in deletion order.
    pub deleted: Vec<Position>,
    pub new_p: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveMarkedChange {
    pub container: Position,
    /// Former positions in move order.
    pub moved: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkedContainerChange {
    pub container: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupState {
    /// Sub-beads are still being appended.
    Open,
    Closed,
}

/// A compound operation replayed as a unit.
#[derive(Debug, Clone, Serialize)]
pub struct GroupChange {
    pub state: GroupState,
    pub items: Vec<Bead>,
    pub verbose: bool,
    pub report_flag: bool,
    pub new_p: Option<Position>,
}

impl GroupChange {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == GroupState::Open
    }
}

/// The innermost open group at or below `bead`.
pub(crate) fn innermost_open_group(bead: &mut Bead) -> Option<&mut Bead> {
    if !bead.is_open_group() {
        return None;
    }
    let descend = bead
        .group()
        .and_then(|g| g.items.last())
        .is_some_and(Bead::is_open_group);
    if descend {
        match &mut bead.kind {
            BeadKind::Group(g) => g.items.last_mut().and_then(innermost_open_group),
            _ => None,
        }
    } else {
        Some(bead)
    }
}
