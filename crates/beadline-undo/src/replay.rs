#![forbid(unsafe_code)]

//! Replaying beads against a document, in either direction.
//!
//! Each bead kind has one handler parameterised by [`Direction`]: undo
//! applies the "old" side of the recorded data, redo the "new" side. After a
//! non-group handler runs, the bead's dirty list is re-applied and the node's
//! marked bit is restored from the matching side.

use beadline_outline::{
    CLONES_CONTAINER, COPIES_CONTAINER, Document, NodeId, Position, Selection,
};

use crate::bead::{
    Bead, BeadKind, CloneChange, ContentChange, DeleteChange, DeleteMarkedChange, DemoteChange,
    InsertChange, MarkedContainerChange, MoveChange, MoveMarkedChange, NodeText, PromoteChange,
    SortChange, TreeChange, TypingChange,
};
use crate::error::{Result, UndoError};
use crate::text::reconstruct;
use crate::tree::{restore_tree, save_tree};

/// Which side of a bead to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Undo,
    Redo,
}

impl Direction {
    /// `old` when undoing, `new` when redoing.
    pub fn pick<T>(self, old: T, new: T) -> T {
        match self {
            Self::Undo => old,
            Self::Redo => new,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// State shared by nested replays.
#[derive(Debug, Default)]
pub(crate) struct ReplayContext {
    /// Number of enclosing groups. Selection and scroll are only restored at depth 0.
    pub group_depth: usize,
}

/// Replay one bead. Returns the number of leaf operations applied.
pub(crate) fn replay_bead<D: Document + ?Sized>(
    bead: &mut Bead,
    dir: Direction,
    doc: &mut D,
    ctx: &mut ReplayContext,
) -> Result<usize> {
    tracing::debug!(
        target: "beadline.undo",
        direction = dir.as_str(),
        kind = bead.kind_name(),
        label = %bead.undo_type,
        depth = ctx.group_depth,
        "replaying bead"
    );
    if matches!(bead.kind, BeadKind::Group(_)) {
        return replay_group(bead, dir, doc, ctx);
    }

    let p = &bead.p;
    let sel = dir.pick(bead.old_sel, bead.new_sel);
    match &mut bead.kind {
        BeadKind::Node(change) | BeadKind::Body(change) => {
            replay_contents(doc, p, change, dir, sel, ctx)?;
        }
        BeadKind::Headline(change) => {
            doc.set_head(p.v(), dir.pick(&change.old_head, &change.new_head))?;
            select_if_needed(doc, p);
        }
        BeadKind::Tree(change) => replay_tree(doc, p, change, dir, sel, ctx)?,
        BeadKind::Typing(change) => replay_typing(doc, p, change, dir, sel, ctx)?,
        BeadKind::Insert(change) => replay_insert(doc, p, change, dir)?,
        BeadKind::Delete(change) => replay_delete(doc, p, change, dir)?,
        BeadKind::Move(change) => replay_move(doc, p, change, dir)?,
        BeadKind::Clone(change) => replay_clone(doc, p, change, dir)?,
        BeadKind::Hoist => {
            doc.select_position(p);
            match dir {
                Direction::Undo => doc.dehoist()?,
                Direction::Redo => doc.hoist()?,
            }
        }
        BeadKind::Dehoist => {
            doc.select_position(p);
            match dir {
                Direction::Undo => doc.hoist()?,
                Direction::Redo => doc.dehoist()?,
            }
        }
        BeadKind::Mark => {
            if ctx.group_depth == 0 {
                select_if_needed(doc, p);
            }
        }
        BeadKind::Sort(change) => replay_sort(doc, p, change, dir)?,
        BeadKind::Demote(change) => replay_demote(doc, p, change, dir)?,
        BeadKind::Promote(change) => replay_promote(doc, p, change, dir)?,
        BeadKind::ClearRecentFiles(change) => {
            doc.set_recent_files(dir.pick(&change.old_files, &change.new_files).clone());
        }
        BeadKind::DeleteMarkedNodes(change) => replay_delete_marked(doc, p, change, dir)?,
        BeadKind::MoveMarkedNodes(change) => replay_move_marked(doc, p, change, dir)?,
        BeadKind::CloneMarkedNodes(change) => {
            replay_marked_container(doc, p, change, dir, CLONES_CONTAINER)?;
        }
        BeadKind::CopyMarkedNodes(change) => {
            replay_marked_container(doc, p, change, dir, COPIES_CONTAINER)?;
        }
        BeadKind::Group(_) => {}
    }

    apply_dirty(doc, &bead.dirty)?;
    update_marks(doc, &bead.p, dir.pick(bead.old_marked, bead.new_marked))?;
    Ok(1)
}

// ============================================================================
// Shared helpers
// ============================================================================

fn select_if_needed<D: Document + ?Sized>(doc: &mut D, p: &Position) {
    if doc.current().as_ref() != Some(p) {
        doc.select_position(p);
    }
}

fn restore_view<D: Document + ?Sized>(
    doc: &mut D,
    sel: Option<Selection>,
    y_scroll: Option<i32>,
    ctx: &ReplayContext,
) {
    if ctx.group_depth > 0 {
        return;
    }
    if let Some(sel) = sel {
        doc.set_selection(sel);
    }
    if let Some(y) = y_scroll {
        doc.set_y_scroll(y);
    }
}

fn apply_dirty<D: Document + ?Sized>(doc: &mut D, dirty: &[NodeId]) -> Result<()> {
    for &v in dirty {
        doc.mark_dirty(v)?;
    }
    Ok(())
}

fn update_marks<D: Document + ?Sized>(doc: &mut D, p: &Position, marked: bool) -> Result<()> {
    doc.set_marked(p.v(), marked)?;
    doc.set_dirty(p.v())?;
    doc.set_changed(true);
    Ok(())
}

/// Link `p` after `back`, else as first child of `parent`, else as first top-level node.
fn relink<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    back: Option<&Position>,
    parent: Option<&Position>,
) -> Result<Position> {
    let linked = match (back, parent) {
        (Some(back), _) => doc.link_after(p, back)?,
        (None, Some(parent)) => doc.link_as_nth_child(p, parent, 0)?,
        (None, None) => doc.link_as_root(p)?,
    };
    Ok(linked)
}

/// Swap one parent link of `v` from `from` to `to`.
fn reparent<D: Document + ?Sized>(doc: &mut D, v: NodeId, from: NodeId, to: NodeId) -> Result<()> {
    let mut parents = doc.parents(v).to_vec();
    if let Some(i) = parents.iter().position(|&x| x == from) {
        parents.remove(i);
    }
    parents.push(to);
    doc.set_parents(v, parents)?;
    Ok(())
}

fn restore_texts<D: Document + ?Sized>(doc: &mut D, texts: &[NodeText]) -> Result<()> {
    for text in texts {
        doc.set_head(text.v, &text.head)?;
        doc.set_body(text.v, &text.body)?;
    }
    Ok(())
}

// ============================================================================
// Content
// ============================================================================

fn replay_contents<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &ContentChange,
    dir: Direction,
    sel: Option<Selection>,
    ctx: &ReplayContext,
) -> Result<()> {
    let (head, body, y) = match dir {
        Direction::Undo => (&change.old_head, &change.old_body, change.old_y_scroll),
        Direction::Redo => (&change.new_head, &change.new_body, change.new_y_scroll),
    };
    doc.set_head(p.v(), head)?;
    doc.set_body(p.v(), body)?;
    select_if_needed(doc, p);
    restore_view(doc, sel, Some(y), ctx);
    Ok(())
}

fn replay_tree<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &mut TreeChange,
    dir: Direction,
    sel: Option<Selection>,
    ctx: &ReplayContext,
) -> Result<()> {
    match dir {
        Direction::Undo => {
            if change.new_tree.is_none() {
                change.new_tree = Some(save_tree(&*doc, p));
            }
            restore_tree(doc, &change.old_tree)?;
        }
        Direction::Redo => {
            let snapshot = change
                .new_tree
                .as_ref()
                .ok_or_else(|| UndoError::inconsistency("redo tree", "no after-snapshot"))?;
            restore_tree(doc, snapshot)?;
        }
    }
    doc.select_position(p);
    restore_view(doc, sel, None, ctx);
    Ok(())
}

fn replay_typing<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &TypingChange,
    dir: Direction,
    sel: Option<Selection>,
    ctx: &ReplayContext,
) -> Result<()> {
    let (middle, newlines, y) = match dir {
        Direction::Undo => (&change.old_middle, change.old_newlines, change.old_y_scroll),
        Direction::Redo => (&change.new_middle, change.new_newlines, change.new_y_scroll),
    };
    let text = reconstruct(
        doc.body(p.v()),
        change.leading,
        change.trailing,
        middle,
        newlines,
    );
    doc.set_body(p.v(), &text)?;
    select_if_needed(doc, p);
    restore_view(doc, sel, y, ctx);
    Ok(())
}

// ============================================================================
// Structure
// ============================================================================

fn replay_insert<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &InsertChange,
    dir: Direction,
) -> Result<()> {
    match dir {
        Direction::Undo => {
            doc.delete_position(&change.new_p)?;
            if let Some(paste) = &change.paste_as_clone {
                restore_texts(doc, &paste.before)?;
            }
            doc.select_position(p);
        }
        Direction::Redo => {
            let new_p = relink(
                doc,
                &change.new_p,
                change.new_back.as_ref(),
                change.new_parent.as_ref(),
            )?;
            if let Some(paste) = &change.paste_as_clone {
                restore_texts(doc, &paste.after)?;
            }
            doc.select_position(&new_p);
        }
    }
    Ok(())
}

fn replay_delete<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &DeleteChange,
    dir: Direction,
) -> Result<()> {
    match dir {
        Direction::Undo => {
            let restored = relink(doc, p, change.old_back.as_ref(), change.old_parent.as_ref())?;
            doc.select_position(&restored);
        }
        Direction::Redo => {
            doc.delete_position(p)?;
            if let Some(new_p) = &change.new_p {
                doc.select_position(new_p);
            }
        }
    }
    Ok(())
}

fn replay_move<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &MoveChange,
    dir: Direction,
) -> Result<()> {
    let old = (change.old_parent_v, change.old_n);
    let new = (change.new_parent_v, change.new_n);
    let (from, to, target) = match dir {
        Direction::Undo => (new, old, p),
        Direction::Redo => (old, new, &change.new_p),
    };
    move_link(doc, p.v(), from, to)?;
    doc.select_position(target);
    Ok(())
}

/// Move `v` from child `from.1` of `from.0` to child `to.1` of `to.0`.
fn move_link<D: Document + ?Sized>(
    doc: &mut D,
    v: NodeId,
    from: (NodeId, usize),
    to: (NodeId, usize),
) -> Result<()> {
    let (from_parent, from_n) = from;
    let (to_parent, to_n) = to;
    let mut source = doc.children(from_parent).to_vec();
    if source.get(from_n) != Some(&v) {
        return Err(UndoError::inconsistency(
            "move",
            format!("child {from_n} of {from_parent:?} is not {v:?}"),
        ));
    }
    source.remove(from_n);
    let mut target = if to_parent == from_parent {
        source.clone()
    } else {
        doc.children(to_parent).to_vec()
    };
    if to_n > target.len() {
        return Err(UndoError::inconsistency(
            "move",
            format!("index {to_n} out of range for {to_parent:?}"),
        ));
    }
    target.insert(to_n, v);
    if to_parent != from_parent {
        doc.set_children(from_parent, source)?;
    }
    doc.set_children(to_parent, target)?;
    reparent(doc, v, from_parent, to_parent)
}

fn replay_clone<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &CloneChange,
    dir: Direction,
) -> Result<()> {
    match dir {
        Direction::Undo => {
            doc.delete_position(&change.new_p)?;
            doc.select_position(p);
        }
        Direction::Redo => {
            let new_p = relink(
                doc,
                &change.new_p,
                change.new_back.as_ref(),
                change.new_parent.as_ref(),
            )?;
            doc.select_position(&new_p);
        }
    }
    Ok(())
}

fn replay_sort<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &SortChange,
    dir: Direction,
) -> Result<()> {
    let parent_v = doc.parent_node(p);
    let children = dir.pick(&change.old_children, &change.new_children).clone();
    doc.set_children(parent_v, children)?;

    let target = if change.sort_children {
        doc.parent(p).or_else(|| doc.root_position())
    } else {
        doc.children(parent_v)
            .iter()
            .position(|&v| v == p.v())
            .map(|n| p.sibling(p.v(), n))
    };
    doc.select_position(target.as_ref().unwrap_or(p));
    Ok(())
}

fn replay_demote<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &DemoteChange,
    dir: Direction,
) -> Result<()> {
    let parent_v = doc.parent_node(p);
    let sibs = &change.following_sibs;
    let split = p.child_index() + 1;
    match dir {
        Direction::Undo => {
            let mut kids = doc.children(p.v()).to_vec();
            let keep = kids.len().checked_sub(sibs.len()).filter(|&k| kids[k..] == sibs[..]);
            let Some(keep) = keep else {
                return Err(UndoError::inconsistency(
                    "undo demote",
                    "demoted siblings are not the last children",
                ));
            };
            kids.truncate(keep);
            let mut parent_kids = doc.children(parent_v).to_vec();
            parent_kids.extend_from_slice(sibs);
            doc.set_children(p.v(), kids)?;
            doc.set_children(parent_v, parent_kids)?;
            for &sib in sibs {
                reparent(doc, sib, p.v(), parent_v)?;
            }
        }
        Direction::Redo => {
            let mut parent_kids = doc.children(parent_v).to_vec();
            if parent_kids.get(split..) != Some(&sibs[..]) {
                return Err(UndoError::inconsistency(
                    "redo demote",
                    "following siblings changed",
                ));
            }
            parent_kids.truncate(split);
            let mut kids = doc.children(p.v()).to_vec();
            kids.extend_from_slice(sibs);
            doc.set_children(parent_v, parent_kids)?;
            doc.set_children(p.v(), kids)?;
            for &sib in sibs {
                reparent(doc, sib, parent_v, p.v())?;
            }
        }
    }
    doc.select_position(p);
    Ok(())
}

fn replay_promote<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &PromoteChange,
    dir: Direction,
) -> Result<()> {
    let parent_v = doc.parent_node(p);
    let children = &change.children;
    let split = p.child_index() + 1;
    let mut parent_kids = doc.children(parent_v).to_vec();
    match dir {
        Direction::Undo => {
            let end = split + children.len();
            if parent_kids.get(split..end) != Some(&children[..]) {
                return Err(UndoError::inconsistency(
                    "undo promote",
                    "promoted children are not p's following siblings",
                ));
            }
            parent_kids.drain(split..end);
            doc.set_children(parent_v, parent_kids)?;
            doc.set_children(p.v(), children.clone())?;
            for &child in children {
                reparent(doc, child, parent_v, p.v())?;
            }
        }
        Direction::Redo => {
            if split > parent_kids.len() {
                return Err(UndoError::inconsistency("redo promote", "position vanished"));
            }
            let tail = parent_kids.split_off(split);
            parent_kids.extend_from_slice(children);
            parent_kids.extend(tail);
            doc.set_children(parent_v, parent_kids)?;
            doc.set_children(p.v(), Vec::new())?;
            for &child in children {
                reparent(doc, child, p.v(), parent_v)?;
            }
        }
    }
    doc.select_position(p);
    Ok(())
}

// ============================================================================
// Bulk marked-node commands
// ============================================================================

fn replay_delete_marked<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &mut DeleteMarkedChange,
    dir: Direction,
) -> Result<()> {
    match dir {
        Direction::Undo => {
            for q in change.deleted.iter().rev() {
                let parent_v = doc.parent_node(q);
                doc.add_link(q.v(), q.child_index(), parent_v)?;
            }
            doc.select_position(p);
        }
        Direction::Redo => {
            doc.select_position(p);
            change.deleted = doc.delete_marked()?;
            if let Some(new_p) = &change.new_p {
                doc.select_position(new_p);
            }
        }
    }
    Ok(())
}

fn replay_move_marked<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &mut MoveMarkedChange,
    dir: Direction,
) -> Result<()> {
    match dir {
        Direction::Undo => {
            let container_v = change.container.v();
            if !doc.exists(&change.container) {
                return Err(UndoError::inconsistency(
                    "undo move-marked-nodes",
                    "container is not where it was left",
                ));
            }
            for q in change.moved.iter().rev() {
                let last = doc.children(container_v).len().checked_sub(1);
                let Some(last) = last.filter(|&n| doc.children(container_v)[n] == q.v()) else {
                    return Err(UndoError::inconsistency(
                        "undo move-marked-nodes",
                        format!("{:?} is not the last moved node", q.v()),
                    ));
                };
                doc.cut_link(q.v(), last, container_v)?;
                let parent_v = doc.parent_node(q);
                doc.add_link(q.v(), q.child_index(), parent_v)?;
            }
            let root = doc.hidden_root();
            let index = doc
                .children(root)
                .iter()
                .position(|&v| v == container_v)
                .ok_or_else(|| {
                    UndoError::inconsistency("undo move-marked-nodes", "container vanished")
                })?;
            doc.cut_link(container_v, index, root)?;
            doc.select_position(p);
        }
        Direction::Redo => {
            doc.select_position(p);
            let Some(moved) = doc.move_marked(p)? else {
                return Err(UndoError::inconsistency(
                    "redo move-marked-nodes",
                    "no marked nodes to move",
                ));
            };
            change.container = moved.container;
            change.moved = moved.moved;
            doc.select_position(&change.container);
        }
    }
    Ok(())
}

fn replay_marked_container<D: Document + ?Sized>(
    doc: &mut D,
    p: &Position,
    change: &mut MarkedContainerChange,
    dir: Direction,
    container_head: &'static str,
) -> Result<()> {
    match dir {
        Direction::Undo => {
            let next = doc.next(p).filter(|next| doc.head(next.v()) == container_head);
            let Some(next) = next else {
                return Err(UndoError::inconsistency(
                    "undo marked-node container",
                    format!("expected {container_head:?} after the recorded position"),
                ));
            };
            doc.delete_position(&next)?;
            doc.set_dirty(p.v())?;
            doc.select_position(p);
        }
        Direction::Redo => {
            doc.select_position(p);
            change.container = if container_head == CLONES_CONTAINER {
                doc.clone_marked(p)?
            } else {
                doc.copy_marked(p)?
            };
        }
    }
    Ok(())
}

// ============================================================================
// Groups
// ============================================================================

fn replay_group<D: Document + ?Sized>(
    bead: &mut Bead,
    dir: Direction,
    doc: &mut D,
    ctx: &mut ReplayContext,
) -> Result<usize> {
    let Bead {
        undo_type,
        p,
        old_marked,
        new_marked,
        old_sel,
        new_sel,
        dirty,
        kind,
    } = bead;
    let BeadKind::Group(group) = kind else {
        return Err(UndoError::inconsistency("group replay", "bead is not a group"));
    };

    ctx.group_depth += 1;
    let mut count = 0;
    let result = match dir {
        Direction::Undo => group
            .items
            .iter_mut()
            .rev()
            .try_for_each(|item| replay_bead(item, dir, doc, ctx).map(|n| count += n)),
        Direction::Redo => group
            .items
            .iter_mut()
            .try_for_each(|item| replay_bead(item, dir, doc, ctx).map(|n| count += n)),
    };
    ctx.group_depth -= 1;
    result?;

    apply_dirty(doc, dirty)?;
    update_marks(doc, p, dir.pick(*old_marked, *new_marked))?;
    if group.verbose || group.report_flag {
        tracing::info!(
            target: "beadline.undo",
            direction = dir.as_str(),
            label = %undo_type,
            items = count,
            "replayed group"
        );
    }
    let target = match dir {
        Direction::Undo => &*p,
        Direction::Redo => group.new_p.as_ref().unwrap_or(p),
    };
    doc.select_position(target);
    if ctx.group_depth == 0
        && let Some(sel) = dir.pick(*old_sel, *new_sel)
    {
        doc.set_selection(sel);
    }
    Ok(count)
}
