#![forbid(unsafe_code)]

//! The [`Document`] trait: everything the undo engine needs from an outline.
//!
//! Implementors supply node storage, link primitives, view state, and the
//! bulk commands. Navigation, relinking, and flag helpers have default
//! implementations built on top of those.
//!
//! # Invariants
//!
//! - For every linked vnode `c` and parent `p`, the number of times `p`
//!   appears in `c.parents` equals the number of times `c` appears in
//!   `p.children`. [`Document::check_outline`] verifies this.
//! - Reads of unknown node ids return empty values; writes fail with
//!   [`OutlineError::UnknownNode`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OutlineError, Result};
use crate::node::{NodeId, StatusBits, UnknownAttributes, is_at_file_headline};
use crate::position::Position;

/// A selection range in the body editor, in character offsets.
///
/// `end` is the insert point; a caret has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty selection at `offset`.
    #[must_use]
    pub const fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    #[must_use]
    pub const fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// The insert point.
    #[must_use]
    pub const fn insert(&self) -> usize {
        self.end
    }
}

/// Result of [`Document::move_marked`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedMarked {
    /// The "Moved marked nodes" container.
    pub container: Position,
    /// Former position of each moved node, in the order the nodes were moved.
    pub moved: Vec<Position>,
}

/// Headline of the container created by [`Document::clone_marked`].
pub const CLONES_CONTAINER: &str = "Clones of marked nodes";
/// Headline of the container created by [`Document::copy_marked`].
pub const COPIES_CONTAINER: &str = "Copies of marked nodes";
/// Headline of the container created by [`Document::move_marked`].
pub const MOVED_CONTAINER: &str = "Moved marked nodes";

/// An outline the undo engine can read, mutate, and navigate.
pub trait Document {
    // ========================================================================
    // Node storage
    // ========================================================================

    /// The invisible vnode whose children are the top-level nodes.
    fn hidden_root(&self) -> NodeId;

    fn contains(&self, v: NodeId) -> bool;

    fn head(&self, v: NodeId) -> &str;

    fn body(&self, v: NodeId) -> &str;

    fn status(&self, v: NodeId) -> StatusBits;

    fn parents(&self, v: NodeId) -> &[NodeId];

    fn children(&self, v: NodeId) -> &[NodeId];

    fn unknown_attributes(&self, v: NodeId) -> Option<&UnknownAttributes>;

    fn set_head(&mut self, v: NodeId, head: &str) -> Result<()>;

    fn set_body(&mut self, v: NodeId, body: &str) -> Result<()>;

    fn set_status(&mut self, v: NodeId, status: StatusBits) -> Result<()>;

    fn set_parents(&mut self, v: NodeId, parents: Vec<NodeId>) -> Result<()>;

    fn set_children(&mut self, v: NodeId, children: Vec<NodeId>) -> Result<()>;

    fn set_unknown_attributes(
        &mut self,
        v: NodeId,
        attributes: Option<UnknownAttributes>,
    ) -> Result<()>;

    fn is_marked(&self, v: NodeId) -> bool {
        self.status(v).contains(StatusBits::MARKED)
    }

    fn is_dirty(&self, v: NodeId) -> bool {
        self.status(v).contains(StatusBits::DIRTY)
    }

    fn is_any_at_file_node(&self, v: NodeId) -> bool {
        is_at_file_headline(self.head(v))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// The selected position, if any.
    fn current(&self) -> Option<Position>;

    /// The vnode whose children list holds `p`.
    fn parent_node(&self, p: &Position) -> NodeId {
        p.parent_v().unwrap_or_else(|| self.hidden_root())
    }

    /// True if every link along `p`'s path is present.
    fn exists(&self, p: &Position) -> bool {
        let mut parent = self.hidden_root();
        for &(v, index) in p.stack() {
            if self.children(parent).get(index) != Some(&v) {
                return false;
            }
            parent = v;
        }
        self.children(parent).get(p.child_index()) == Some(&p.v())
    }

    fn back(&self, p: &Position) -> Option<Position> {
        let n = p.child_index().checked_sub(1)?;
        let v = *self.children(self.parent_node(p)).get(n)?;
        Some(p.sibling(v, n))
    }

    fn next(&self, p: &Position) -> Option<Position> {
        let n = p.child_index() + 1;
        let v = *self.children(self.parent_node(p)).get(n)?;
        Some(p.sibling(v, n))
    }

    fn parent(&self, p: &Position) -> Option<Position> {
        p.parent_position()
    }

    fn first_child(&self, p: &Position) -> Option<Position> {
        let v = *self.children(p.v()).first()?;
        Some(p.child(v, 0))
    }

    /// The first top-level position.
    fn root_position(&self) -> Option<Position> {
        let v = *self.children(self.hidden_root()).first()?;
        Some(Position::top_level(v, 0))
    }

    /// The position following `p`'s subtree in outline order.
    fn node_after_tree(&self, p: &Position) -> Option<Position> {
        let mut cursor = Some(p.clone());
        while let Some(q) = cursor {
            if let Some(next) = self.next(&q) {
                return Some(next);
            }
            cursor = self.parent(&q);
        }
        None
    }

    /// The next position in outline (preorder) order.
    fn thread_next(&self, p: &Position) -> Option<Position> {
        self.first_child(p).or_else(|| self.node_after_tree(p))
    }

    /// The position that takes `p`'s place after `p` is unlinked.
    fn position_after_deleted_tree(&self, p: &Position) -> Option<Position> {
        if let Some(next) = self.next(p) {
            return Some(p.sibling(next.v(), p.child_index()));
        }
        self.node_after_tree(p)
    }

    /// Every position in outline order.
    fn positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        let mut cursor = self.root_position();
        while let Some(p) = cursor {
            cursor = self.thread_next(&p);
            out.push(p);
        }
        out
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Insert `v` as child `index` of `parent_v`, adding parent links for
    /// `v`'s subtree if this is `v`'s first parent.
    fn add_link(&mut self, v: NodeId, index: usize, parent_v: NodeId) -> Result<()>;

    /// Remove child `index` of `parent_v`, which must be `v`, removing parent
    /// links from `v`'s subtree if `v` has no parents left.
    fn cut_link(&mut self, v: NodeId, index: usize, parent_v: NodeId) -> Result<()>;

    /// Link `p.v()` immediately after `after`.
    fn link_after(&mut self, p: &Position, after: &Position) -> Result<Position> {
        let parent_v = self.parent_node(after);
        let n = after.child_index() + 1;
        self.add_link(p.v(), n, parent_v)?;
        Ok(after.sibling(p.v(), n))
    }

    /// Link `p.v()` as the `n`th child of `parent`.
    fn link_as_nth_child(&mut self, p: &Position, parent: &Position, n: usize) -> Result<Position> {
        self.add_link(p.v(), n, parent.v())?;
        Ok(parent.child(p.v(), n))
    }

    /// Link `p.v()` as the first top-level node.
    fn link_as_root(&mut self, p: &Position) -> Result<Position> {
        let root = self.hidden_root();
        self.add_link(p.v(), 0, root)?;
        Ok(Position::top_level(p.v(), 0))
    }

    /// Unlink `p` from its parent.
    fn unlink(&mut self, p: &Position) -> Result<()> {
        let parent_v = self.parent_node(p);
        self.cut_link(p.v(), p.child_index(), parent_v)
    }

    /// Unlink `p` and select a neighbouring position.
    fn delete_position(&mut self, p: &Position) -> Result<()>;

    // ========================================================================
    // Flags
    // ========================================================================

    fn set_marked(&mut self, v: NodeId, marked: bool) -> Result<()> {
        let mut status = self.status(v);
        status.set(StatusBits::MARKED, marked);
        self.set_status(v, status)
    }

    /// Set the dirty bit on `v` alone.
    fn mark_dirty(&mut self, v: NodeId) -> Result<()> {
        let status = self.status(v) | StatusBits::DIRTY;
        self.set_status(v, status)
    }

    /// `v` and all its ancestors (through every clone) that are @file nodes.
    fn at_file_ancestors(&self, v: NodeId) -> Vec<NodeId> {
        let root = self.hidden_root();
        let mut seen = HashSet::new();
        let mut pending = vec![v];
        let mut out = Vec::new();
        while let Some(node) = pending.pop() {
            if node == root || !seen.insert(node) {
                continue;
            }
            if self.is_any_at_file_node(node) {
                out.push(node);
            }
            pending.extend_from_slice(self.parents(node));
        }
        out
    }

    /// Mark `v` dirty along with every @file ancestor.
    fn set_dirty(&mut self, v: NodeId) -> Result<()> {
        for node in self.at_file_ancestors(v) {
            self.mark_dirty(node)?;
        }
        self.mark_dirty(v)
    }

    /// Record that the document differs from its saved state.
    fn set_changed(&mut self, changed: bool);

    fn is_changed(&self) -> bool;

    // ========================================================================
    // View state
    // ========================================================================

    fn select_position(&mut self, p: &Position);

    fn set_current_position(&mut self, p: &Position) {
        self.select_position(p);
    }

    fn selection(&self) -> Selection;

    fn set_selection(&mut self, selection: Selection);

    fn y_scroll(&self) -> i32;

    fn set_y_scroll(&mut self, y: i32);

    // ========================================================================
    // Commands
    // ========================================================================

    /// Hoist the current position.
    fn hoist(&mut self) -> Result<()>;

    /// Undo the most recent hoist. Does nothing if nothing is hoisted.
    fn dehoist(&mut self) -> Result<()>;

    fn recent_files(&self) -> &[String];

    fn set_recent_files(&mut self, files: Vec<String>);

    /// Unlink every marked position, returning each former position in
    /// deletion order.
    fn delete_marked(&mut self) -> Result<Vec<Position>>;

    /// Insert a "Clones of marked nodes" container after `p` holding a clone
    /// of each marked vnode. Returns `None` if nothing is marked.
    fn clone_marked(&mut self, p: &Position) -> Result<Option<Position>>;

    /// Like [`Document::clone_marked`] but with deep copies.
    fn copy_marked(&mut self, p: &Position) -> Result<Option<Position>>;

    /// Move every marked position into a new "Moved marked nodes" container.
    fn move_marked(&mut self, p: &Position) -> Result<Option<MovedMarked>>;

    /// Verify the parent/child link invariant for every linked node.
    fn check_outline(&self) -> Result<()>;
}

/// Walk a `Document` and report link mismatches.
pub(crate) fn check_links<D: Document + ?Sized>(doc: &D) -> Result<()> {
    let root = doc.hidden_root();
    let mut reachable = HashSet::new();
    let mut pending = vec![root];
    while let Some(v) = pending.pop() {
        if !reachable.insert(v) {
            continue;
        }
        pending.extend_from_slice(doc.children(v));
    }
    for &v in &reachable {
        for &child in doc.children(v) {
            let as_child = doc.children(v).iter().filter(|&&c| c == child).count();
            let as_parent = doc.parents(child).iter().filter(|&&p| p == v).count();
            if as_child != as_parent {
                return Err(OutlineError::invalid_state(format!(
                    "{child:?} appears {as_child} times under {v:?} but lists it {as_parent} times"
                )));
            }
        }
        for &parent in doc.parents(v) {
            if !reachable.contains(&parent) {
                return Err(OutlineError::invalid_state(format!(
                    "{v:?} lists unlinked parent {parent:?}"
                )));
            }
        }
    }
    Ok(())
}
