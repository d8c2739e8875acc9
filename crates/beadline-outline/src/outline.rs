#![forbid(unsafe_code)]

//! In-memory outline backed by a vnode arena.
//!
//! Vnodes are never freed: an unlinked vnode keeps its id, so positions
//! recorded before a delete can be relinked later.

use std::fmt::{self, Write as _};

use crate::document::{
    CLONES_CONTAINER, COPIES_CONTAINER, Document, MOVED_CONTAINER, MovedMarked, Selection,
    check_links,
};
use crate::error::{OutlineError, Result};
use crate::node::{NodeId, StatusBits, UnknownAttributes, Vnode};
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HoistEntry {
    p: Position,
    expanded: bool,
}

/// An outline document.
#[derive(Clone)]
pub struct Outline {
    nodes: Vec<Vnode>,
    hidden_root: NodeId,
    current: Option<Position>,
    selection: Selection,
    y_scroll: i32,
    changed: bool,
    hoist_stack: Vec<HoistEntry>,
    recent_files: Vec<String>,
}

impl fmt::Debug for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outline")
            .field("vnodes", &self.nodes.len())
            .field("current", &self.current)
            .field("changed", &self.changed)
            .field("hoisted", &self.hoist_stack.len())
            .finish()
    }
}

impl Default for Outline {
    fn default() -> Self {
        Self::new()
    }
}

impl Outline {
    /// Create an empty outline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Vnode::new("<hidden root>", "")],
            hidden_root: NodeId(0),
            current: None,
            selection: Selection::default(),
            y_scroll: 0,
            changed: false,
            hoist_stack: Vec::new(),
            recent_files: Vec::new(),
        }
    }

    /// Number of vnodes ever allocated, linked or not.
    #[must_use]
    pub fn vnode_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the hoist stack.
    #[must_use]
    pub fn hoist_depth(&self) -> usize {
        self.hoist_stack.len()
    }

    /// Look up a vnode.
    pub fn node(&self, v: NodeId) -> Result<&Vnode> {
        self.nodes.get(v.index()).ok_or(OutlineError::UnknownNode(v))
    }

    fn node_mut(&mut self, v: NodeId) -> Result<&mut Vnode> {
        self.nodes
            .get_mut(v.index())
            .ok_or(OutlineError::UnknownNode(v))
    }

    /// Allocate an unlinked vnode.
    pub fn new_vnode(&mut self, head: impl Into<String>, body: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Vnode::new(head, body));
        id
    }

    // ========================================================================
    // Structure edits
    // ========================================================================

    /// Create a node as the `n`th child of `parent` (or of the hidden root).
    ///
    /// The first node inserted into an empty outline becomes current.
    pub fn insert_as_nth_child(
        &mut self,
        parent: Option<&Position>,
        n: usize,
        head: &str,
    ) -> Result<Position> {
        let v = self.new_vnode(head, "");
        let p = match parent {
            Some(parent) => {
                self.add_link(v, n, parent.v())?;
                parent.child(v, n)
            }
            None => {
                self.add_link(v, n, self.hidden_root)?;
                Position::top_level(v, n)
            }
        };
        if self.current.is_none() {
            self.current = Some(p.clone());
        }
        self.changed = true;
        Ok(p)
    }

    /// Create a node as the last child of `parent` (or as the last top-level node).
    pub fn insert_as_last_child(&mut self, parent: Option<&Position>, head: &str) -> Result<Position> {
        let parent_v = parent.map_or(self.hidden_root, Position::v);
        let n = self.node(parent_v)?.children.len();
        self.insert_as_nth_child(parent, n, head)
    }

    /// Create a node directly after `p`.
    pub fn insert_after(&mut self, p: &Position, head: &str) -> Result<Position> {
        let v = self.new_vnode(head, "");
        let new_p = self.link_after(&Position::top_level(v, 0), p)?;
        self.changed = true;
        Ok(new_p)
    }

    /// Link a clone of `p` directly after it.
    pub fn clone_node(&mut self, p: &Position) -> Result<Position> {
        if !self.exists(p) {
            return Err(OutlineError::NoPosition);
        }
        let clone = self.link_after(p, p)?;
        self.set_dirty(p.v())?;
        self.changed = true;
        Ok(clone)
    }

    /// Move `p` to be the `n`th child of `parent` (or a top-level node).
    ///
    /// `parent` must not be a sibling that follows `p`, since unlinking `p`
    /// shifts those indices.
    pub fn move_to_nth_child(
        &mut self,
        p: &Position,
        parent: Option<&Position>,
        n: usize,
    ) -> Result<Position> {
        if let Some(parent) = parent
            && p.is_ancestor_of(parent)
        {
            return Err(OutlineError::invalid_state("cannot move a node into itself"));
        }
        self.unlink(p)?;
        let moved = match parent {
            Some(parent) => self.link_as_nth_child(p, parent, n)?,
            None => {
                self.add_link(p.v(), n, self.hidden_root)?;
                Position::top_level(p.v(), n)
            }
        };
        self.set_dirty(p.v())?;
        self.changed = true;
        Ok(moved)
    }

    /// Sort `p` and its siblings by headline, case-insensitively.
    ///
    /// Returns the sibling lists before and after the sort.
    pub fn sort_siblings(&mut self, p: &Position) -> Result<(Vec<NodeId>, Vec<NodeId>)> {
        let parent_v = self.parent_node(p);
        let old_children = self.node(parent_v)?.children.clone();
        let mut new_children = old_children.clone();
        new_children.sort_by_cached_key(|&v| self.head(v).to_lowercase());
        self.node_mut(parent_v)?.children = new_children.clone();
        self.changed = true;
        Ok((old_children, new_children))
    }

    /// Make `p`'s following siblings its children. Returns the moved nodes.
    pub fn demote(&mut self, p: &Position) -> Result<Vec<NodeId>> {
        let parent_v = self.parent_node(p);
        let split = p.child_index() + 1;
        let parent = self.node_mut(parent_v)?;
        if split > parent.children.len() {
            return Err(OutlineError::NoPosition);
        }
        let following = parent.children.split_off(split);
        self.node_mut(p.v())?.children.extend_from_slice(&following);
        for &sib in &following {
            relink_parent(self.node_mut(sib)?, parent_v, p.v());
        }
        self.set_dirty(p.v())?;
        self.changed = true;
        Ok(following)
    }

    /// Make `p`'s children its following siblings. Returns the moved nodes.
    pub fn promote(&mut self, p: &Position) -> Result<Vec<NodeId>> {
        let parent_v = self.parent_node(p);
        let split = p.child_index() + 1;
        if split > self.node(parent_v)?.children.len() {
            return Err(OutlineError::NoPosition);
        }
        let children = std::mem::take(&mut self.node_mut(p.v())?.children);
        let parent = self.node_mut(parent_v)?;
        let tail = parent.children.split_off(split);
        parent.children.extend_from_slice(&children);
        parent.children.extend(tail);
        for &child in &children {
            relink_parent(self.node_mut(child)?, p.v(), parent_v);
        }
        self.set_dirty(p.v())?;
        self.changed = true;
        Ok(children)
    }

    /// Deep-copy the subtree at `v` into fresh vnodes. The copy is unlinked.
    ///
    /// Only child lists are filled in. Parent links appear when the copy's
    /// root gains its first parent.
    fn copy_tree(&mut self, v: NodeId) -> Result<NodeId> {
        let source = self.node(v)?.clone();
        let mut children = Vec::with_capacity(source.children.len());
        for child in source.children {
            children.push(self.copy_tree(child)?);
        }
        let copy = self.new_vnode(source.head, source.body);
        let node = self.node_mut(copy)?;
        node.status = source.status & StatusBits::MARKED;
        node.unknown_attributes = source.unknown_attributes;
        node.children = children;
        Ok(copy)
    }

    /// Shared walk for clone/copy of marked nodes.
    fn collect_marked(&mut self, p: &Position, head: &str, deep: bool) -> Result<Option<Position>> {
        let container_v = self.new_vnode(head, "");
        let container = self.link_after(&Position::top_level(container_v, 0), p)?;
        let mut added = Vec::new();
        let mut cursor = self.root_position();
        while let Some(q) = cursor {
            if q.v() == container_v {
                cursor = self.node_after_tree(&q);
                continue;
            }
            if self.is_marked(q.v()) && !added.contains(&q.v()) {
                added.push(q.v());
                let linked = if deep { self.copy_tree(q.v())? } else { q.v() };
                let n = self.node(container_v)?.children.len();
                self.add_link(linked, n, container_v)?;
                cursor = self.node_after_tree(&q);
            } else {
                cursor = self.thread_next(&q);
            }
        }
        if added.is_empty() {
            self.unlink(&container)?;
            return Ok(None);
        }
        self.set_dirty(container_v)?;
        self.changed = true;
        self.current = Some(container.clone());
        tracing::debug!(target: "beadline.outline", head, count = added.len(), "collected marked nodes");
        Ok(Some(container))
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render every linked node, one line per position, for comparisons.
    ///
    /// Each line is `<indent><head> [*] | <escaped body>` where `*` marks
    /// marked nodes.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for p in self.positions() {
            let mark = if self.is_marked(p.v()) { " *" } else { "" };
            let body = self.body(p.v()).escape_default();
            let _ = writeln!(
                out,
                "{}{}{} | {}",
                "  ".repeat(p.level()),
                self.head(p.v()),
                mark,
                body
            );
        }
        out
    }

    /// Headlines of every linked position in outline order.
    #[must_use]
    pub fn headlines(&self) -> Vec<String> {
        self.positions()
            .iter()
            .map(|p| self.head(p.v()).to_string())
            .collect()
    }

    /// Position of the first linked occurrence of the headline `head`.
    #[must_use]
    pub fn find(&self, head: &str) -> Option<Position> {
        self.positions().into_iter().find(|p| self.head(p.v()) == head)
    }
}

fn relink_parent(node: &mut Vnode, from: NodeId, to: NodeId) {
    if let Some(i) = node.parents.iter().position(|&p| p == from) {
        node.parents.remove(i);
    }
    node.parents.push(to);
}

impl Outline {
    fn add_parent_links(&mut self, v: NodeId, parent: NodeId) -> Result<()> {
        let node = self.node_mut(v)?;
        node.parents.push(parent);
        if node.parents.len() == 1 {
            for child in node.children.clone() {
                self.add_parent_links(child, v)?;
            }
        }
        Ok(())
    }

    fn cut_parent_links(&mut self, v: NodeId, parent: NodeId) -> Result<()> {
        let node = self.node_mut(v)?;
        if let Some(i) = node.parents.iter().position(|&p| p == parent) {
            node.parents.remove(i);
        }
        if node.parents.is_empty() {
            for child in node.children.clone() {
                self.cut_parent_links(child, v)?;
            }
        }
        Ok(())
    }
}

impl Document for Outline {
    fn hidden_root(&self) -> NodeId {
        self.hidden_root
    }

    fn contains(&self, v: NodeId) -> bool {
        v.index() < self.nodes.len()
    }

    fn head(&self, v: NodeId) -> &str {
        self.nodes.get(v.index()).map_or("", |n| &n.head)
    }

    fn body(&self, v: NodeId) -> &str {
        self.nodes.get(v.index()).map_or("", |n| &n.body)
    }

    fn status(&self, v: NodeId) -> StatusBits {
        self.nodes
            .get(v.index())
            .map_or(StatusBits::empty(), |n| n.status)
    }

    fn parents(&self, v: NodeId) -> &[NodeId] {
        self.nodes.get(v.index()).map_or(&[], |n| &n.parents)
    }

    fn children(&self, v: NodeId) -> &[NodeId] {
        self.nodes.get(v.index()).map_or(&[], |n| &n.children)
    }

    fn unknown_attributes(&self, v: NodeId) -> Option<&UnknownAttributes> {
        self.nodes
            .get(v.index())
            .and_then(|n| n.unknown_attributes.as_ref())
    }

    fn set_head(&mut self, v: NodeId, head: &str) -> Result<()> {
        head.clone_into(&mut self.node_mut(v)?.head);
        Ok(())
    }

    fn set_body(&mut self, v: NodeId, body: &str) -> Result<()> {
        body.clone_into(&mut self.node_mut(v)?.body);
        Ok(())
    }

    fn set_status(&mut self, v: NodeId, status: StatusBits) -> Result<()> {
        self.node_mut(v)?.status = status;
        Ok(())
    }

    fn set_parents(&mut self, v: NodeId, parents: Vec<NodeId>) -> Result<()> {
        self.node_mut(v)?.parents = parents;
        Ok(())
    }

    fn set_children(&mut self, v: NodeId, children: Vec<NodeId>) -> Result<()> {
        self.node_mut(v)?.children = children;
        Ok(())
    }

    fn set_unknown_attributes(
        &mut self,
        v: NodeId,
        attributes: Option<UnknownAttributes>,
    ) -> Result<()> {
        self.node_mut(v)?.unknown_attributes = attributes;
        Ok(())
    }

    fn current(&self) -> Option<Position> {
        self.current.clone()
    }

    fn add_link(&mut self, v: NodeId, index: usize, parent_v: NodeId) -> Result<()> {
        if !self.contains(v) {
            return Err(OutlineError::UnknownNode(v));
        }
        let parent = self.node_mut(parent_v)?;
        let len = parent.children.len();
        if index > len {
            return Err(OutlineError::ChildIndexOutOfRange {
                parent: parent_v,
                index,
                len,
            });
        }
        parent.children.insert(index, v);
        self.add_parent_links(v, parent_v)
    }

    fn cut_link(&mut self, v: NodeId, index: usize, parent_v: NodeId) -> Result<()> {
        let parent = self.node_mut(parent_v)?;
        if parent.children.get(index) != Some(&v) {
            return Err(OutlineError::LinkMismatch {
                parent: parent_v,
                index,
                child: v,
            });
        }
        parent.children.remove(index);
        self.cut_parent_links(v, parent_v)
    }

    fn delete_position(&mut self, p: &Position) -> Result<()> {
        if !self.exists(p) {
            return Err(OutlineError::NoPosition);
        }
        let new_current = self
            .back(p)
            .or_else(|| self.parent(p))
            .or_else(|| self.next(p).map(|next| p.sibling(next.v(), p.child_index())));
        let parent_v = self.parent_node(p);
        self.unlink(p)?;
        if parent_v != self.hidden_root {
            self.set_dirty(parent_v)?;
        }
        self.current = new_current;
        self.changed = true;
        tracing::debug!(target: "beadline.outline", v = p.v().raw(), "deleted position");
        Ok(())
    }

    fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    fn is_changed(&self) -> bool {
        self.changed
    }

    fn select_position(&mut self, p: &Position) {
        self.current = Some(p.clone());
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    fn y_scroll(&self) -> i32 {
        self.y_scroll
    }

    fn set_y_scroll(&mut self, y: i32) {
        self.y_scroll = y;
    }

    fn hoist(&mut self) -> Result<()> {
        let p = self.current.clone().ok_or(OutlineError::NoPosition)?;
        let node = self.node_mut(p.v())?;
        let expanded = node.status.contains(StatusBits::EXPANDED);
        node.status.insert(StatusBits::EXPANDED);
        self.hoist_stack.push(HoistEntry { p, expanded });
        Ok(())
    }

    fn dehoist(&mut self) -> Result<()> {
        let Some(entry) = self.hoist_stack.pop() else {
            return Ok(());
        };
        self.node_mut(entry.p.v())?
            .status
            .set(StatusBits::EXPANDED, entry.expanded);
        self.current = Some(entry.p);
        Ok(())
    }

    fn recent_files(&self) -> &[String] {
        &self.recent_files
    }

    fn set_recent_files(&mut self, files: Vec<String>) {
        self.recent_files = files;
    }

    fn delete_marked(&mut self) -> Result<Vec<Position>> {
        let mut deleted = Vec::new();
        let mut cursor = self.root_position();
        while let Some(p) = cursor {
            if self.is_marked(p.v()) {
                cursor = self.position_after_deleted_tree(&p);
                let parent_v = self.parent_node(&p);
                self.unlink(&p)?;
                if parent_v != self.hidden_root {
                    self.set_dirty(parent_v)?;
                }
                deleted.push(p);
            } else {
                cursor = self.thread_next(&p);
            }
        }
        if !deleted.is_empty() {
            self.current = self.root_position();
            self.changed = true;
        }
        tracing::debug!(target: "beadline.outline", count = deleted.len(), "deleted marked nodes");
        Ok(deleted)
    }

    fn clone_marked(&mut self, p: &Position) -> Result<Option<Position>> {
        self.collect_marked(p, CLONES_CONTAINER, false)
    }

    fn copy_marked(&mut self, p: &Position) -> Result<Option<Position>> {
        self.collect_marked(p, COPIES_CONTAINER, true)
    }

    fn move_marked(&mut self, p: &Position) -> Result<Option<MovedMarked>> {
        if !self.exists(p) {
            return Err(OutlineError::NoPosition);
        }
        let container_v = self.new_vnode(MOVED_CONTAINER, "");
        let index = self.children(self.hidden_root).len();
        self.add_link(container_v, index, self.hidden_root)?;
        let mut moved = Vec::new();
        let mut cursor = self.root_position();
        while let Some(q) = cursor {
            if q.v() == container_v {
                break;
            }
            if self.is_marked(q.v()) {
                cursor = self.position_after_deleted_tree(&q);
                self.unlink(&q)?;
                let n = self.node(container_v)?.children.len();
                self.add_link(q.v(), n, container_v)?;
                moved.push(q);
            } else {
                cursor = self.thread_next(&q);
            }
        }
        let index = self
            .children(self.hidden_root)
            .iter()
            .position(|&v| v == container_v)
            .ok_or_else(|| OutlineError::invalid_state("moved-marked container vanished"))?;
        let container = Position::top_level(container_v, index);
        if moved.is_empty() {
            self.unlink(&container)?;
            return Ok(None);
        }
        self.set_dirty(container_v)?;
        self.current = Some(container.clone());
        self.changed = true;
        tracing::debug!(target: "beadline.outline", count = moved.len(), "moved marked nodes");
        Ok(Some(MovedMarked { container, moved }))
    }

    fn check_outline(&self) -> Result<()> {
        check_links(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Outline, Position, Position, Position) {
        let mut o = Outline::new();
        let a = o.insert_as_last_child(None, "A").unwrap();
        let b = o.insert_as_last_child(Some(&a), "B").unwrap();
        let c = o.insert_as_last_child(None, "C").unwrap();
        (o, a, b, c)
    }

    #[test]
    fn insert_builds_preorder() {
        let (o, ..) = sample();
        assert_eq!(o.headlines(), ["A", "B", "C"]);
        o.check_outline().unwrap();
    }

    #[test]
    fn first_insert_becomes_current() {
        let (o, a, ..) = sample();
        assert_eq!(o.current(), Some(a));
    }

    #[test]
    fn navigation() {
        let (o, a, b, c) = sample();
        assert_eq!(o.next(&a), Some(c.clone()));
        assert_eq!(o.back(&c), Some(a.clone()));
        assert_eq!(o.parent(&b), Some(a.clone()));
        assert_eq!(o.first_child(&a), Some(b.clone()));
        assert_eq!(o.thread_next(&b), Some(c.clone()));
        assert_eq!(o.node_after_tree(&a), Some(c));
        assert!(o.exists(&b));
    }

    #[test]
    fn clone_shares_vnode() {
        let (mut o, _, b, _) = sample();
        let clone = o.clone_node(&b).unwrap();
        assert_eq!(clone.v(), b.v());
        assert_eq!(o.node(b.v()).unwrap().clone_count(), 2);
        o.set_body(b.v(), "shared").unwrap();
        assert_eq!(o.body(clone.v()), "shared");
        o.check_outline().unwrap();
    }

    #[test]
    fn delete_selects_back() {
        let (mut o, a, _, c) = sample();
        o.delete_position(&c).unwrap();
        assert_eq!(o.current(), Some(a));
        assert_eq!(o.headlines(), ["A", "B"]);
        o.check_outline().unwrap();
    }

    #[test]
    fn relink_after_delete_restores_subtree_links() {
        let (mut o, a, b, _) = sample();
        o.delete_position(&a).unwrap();
        assert!(o.parents(b.v()).is_empty());
        o.link_as_root(&a).unwrap();
        assert_eq!(o.parents(b.v()), [a.v()]);
        assert_eq!(o.headlines(), ["A", "B", "C"]);
        o.check_outline().unwrap();
    }

    #[test]
    fn cut_link_rejects_mismatch() {
        let (mut o, a, b, _) = sample();
        let err = o.cut_link(b.v(), 0, o.hidden_root()).unwrap_err();
        assert_eq!(
            err,
            OutlineError::LinkMismatch {
                parent: o.hidden_root(),
                index: 0,
                child: b.v()
            }
        );
        assert!(o.exists(&a));
    }

    #[test]
    fn demote_and_promote_are_inverse() {
        let mut o = Outline::new();
        let a = o.insert_as_last_child(None, "A").unwrap();
        o.insert_as_last_child(None, "B").unwrap();
        o.insert_as_last_child(None, "C").unwrap();
        let following = o.demote(&a).unwrap();
        assert_eq!(following.len(), 2);
        assert_eq!(o.render(), "A | \n  B | \n  C | \n");
        o.check_outline().unwrap();
        let children = o.promote(&a).unwrap();
        assert_eq!(children, following);
        assert_eq!(o.headlines(), ["A", "B", "C"]);
        o.check_outline().unwrap();
    }

    #[test]
    fn sort_siblings_by_headline() {
        let mut o = Outline::new();
        let c = o.insert_as_last_child(None, "c").unwrap();
        o.insert_as_last_child(None, "A").unwrap();
        o.insert_as_last_child(None, "b").unwrap();
        let (old, new) = o.sort_siblings(&c).unwrap();
        assert_ne!(old, new);
        assert_eq!(o.headlines(), ["A", "b", "c"]);
    }

    #[test]
    fn delete_marked_reports_positions_in_order() {
        let mut o = Outline::new();
        let a = o.insert_as_last_child(None, "A").unwrap();
        let b = o.insert_as_last_child(None, "B").unwrap();
        let c = o.insert_as_last_child(None, "C").unwrap();
        o.set_marked(a.v(), true).unwrap();
        o.set_marked(c.v(), true).unwrap();
        let deleted = o.delete_marked().unwrap();
        assert_eq!(deleted[0], a);
        // C shifted down once A was gone.
        assert_eq!(deleted[1], Position::top_level(c.v(), 1));
        assert_eq!(o.headlines(), ["B"]);
        assert_eq!(o.current(), Some(Position::top_level(b.v(), 0)));
        o.check_outline().unwrap();
    }

    #[test]
    fn clone_marked_builds_container() {
        let (mut o, a, b, _) = sample();
        o.set_marked(b.v(), true).unwrap();
        let container = o.clone_marked(&a).unwrap().unwrap();
        assert_eq!(o.head(container.v()), CLONES_CONTAINER);
        assert_eq!(o.children(container.v()), [b.v()]);
        assert_eq!(o.next(&a), Some(container));
        o.check_outline().unwrap();
    }

    #[test]
    fn clone_marked_without_marks_is_noop() {
        let (mut o, a, ..) = sample();
        assert_eq!(o.clone_marked(&a).unwrap(), None);
        assert_eq!(o.headlines(), ["A", "B", "C"]);
        o.check_outline().unwrap();
    }

    #[test]
    fn copy_marked_allocates_new_vnodes() {
        let (mut o, a, _, _) = sample();
        o.set_marked(a.v(), true).unwrap();
        let container = o.copy_marked(&a).unwrap().unwrap();
        let copy = o.children(container.v())[0];
        assert_ne!(copy, a.v());
        assert_eq!(o.head(copy), "A");
        assert_eq!(o.children(copy).len(), 1);
        o.check_outline().unwrap();
    }

    #[test]
    fn copy_marked_links_grandchildren_once() {
        let (mut o, a, b, _) = sample();
        o.insert_as_last_child(Some(&b), "B1").unwrap();
        o.insert_as_last_child(Some(&b), "B2").unwrap();
        o.set_marked(a.v(), true).unwrap();
        let container = o.copy_marked(&a).unwrap().unwrap();
        o.check_outline().unwrap();

        let copy_a = o.children(container.v())[0];
        let copy_b = o.children(copy_a)[0];
        assert_eq!(o.parents(copy_a), [container.v()]);
        assert_eq!(o.parents(copy_b), [copy_a]);
        for &leaf in o.children(copy_b) {
            assert_eq!(o.parents(leaf), [copy_b]);
        }
        assert_eq!(o.parents(b.v()), [a.v()]);

        o.delete_position(&container).unwrap();
        o.check_outline().unwrap();
    }

    #[test]
    fn move_marked_appends_container() {
        let (mut o, a, b, c) = sample();
        o.set_marked(b.v(), true).unwrap();
        o.set_marked(c.v(), true).unwrap();
        let moved = o.move_marked(&a).unwrap().unwrap();
        assert_eq!(moved.moved, vec![b, c]);
        assert_eq!(moved.container.child_index(), 1);
        assert_eq!(o.headlines(), ["A", MOVED_CONTAINER, "B", "C"]);
        assert_eq!(o.head(moved.container.v()), MOVED_CONTAINER);
        o.check_outline().unwrap();
    }

    #[test]
    fn hoist_round_trip() {
        let (mut o, a, ..) = sample();
        o.select_position(&a);
        o.hoist().unwrap();
        assert_eq!(o.hoist_depth(), 1);
        o.dehoist().unwrap();
        assert_eq!(o.hoist_depth(), 0);
        o.dehoist().unwrap();
    }

    #[test]
    fn set_dirty_reaches_at_file_ancestors() {
        let mut o = Outline::new();
        let file = o.insert_as_last_child(None, "@file x.py").unwrap();
        let child = o.insert_as_last_child(Some(&file), "def f").unwrap();
        o.set_dirty(child.v()).unwrap();
        assert!(o.is_dirty(file.v()));
        assert!(o.is_dirty(child.v()));
    }

    #[test]
    fn render_marks_and_escapes() {
        let (mut o, a, ..) = sample();
        o.set_body(a.v(), "x\ny").unwrap();
        o.set_marked(a.v(), true).unwrap();
        assert!(o.render().starts_with("A * | x\\ny\n"));
    }
}
