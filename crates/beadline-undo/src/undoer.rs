#![forbid(unsafe_code)]

//! The undo manager.
//!
//! # Recording
//!
//! Commands bracket each change with a `before_*`/`after_*` pair:
//!
//! ```rust,ignore
//! let data = undoer.before_change_node_contents(&outline, &p);
//! outline.set_body(p.v(), "new text")?;
//! undoer.after_change_node_contents(&outline, "Change Body", data);
//! ```
//!
//! Typing goes through [`Undoer::set_undo_typing_params`], which merges
//! keystrokes into the top bead according to the configured granularity.
//! Compound commands wrap their steps in
//! [`Undoer::before_change_group`]/[`Undoer::after_change_group`].
//!
//! # Replay
//!
//! [`Undoer::undo`] replays the bead at the cursor backwards and moves the
//! cursor down; [`Undoer::redo`] replays the next bead forwards. Recording
//! calls made while a replay is running are ignored.
//!
//! # Invariants
//!
//! - Recording a top-level bead drops every redoable bead.
//! - A failed replay leaves the cursor where it was.
//! - `undo_type()` is the label of the bead at the cursor, or `"Can't Undo"`.

use std::fmt;

use beadline_outline::{Document, NodeId, Position, Selection, MovedMarked};

use crate::bead::{
    Bead, BeadKind, CloneChange, ContentChange, DeleteChange, DeleteMarkedChange, DemoteChange,
    GroupChange, GroupState, HeadlineChange, InsertChange, MarkedContainerChange, MoveChange,
    MoveMarkedChange, PasteAsClone, PromoteChange, RecentFilesChange, SortChange, TreeChange,
    TypingChange, innermost_open_group,
};
use crate::config::UndoConfig;
use crate::error::{Result, UndoError};
use crate::pending::{
    CloneUndoData, CommonData, DeleteUndoData, InsertUndoData, MarkUndoData, MoveUndoData,
    NodeUndoData, RecentFilesUndoData, SortUndoData, TreeUndoData, clean_at_file_ancestors,
    node_text,
};
use crate::replay::{Direction, ReplayContext, replay_bead};
use crate::stack::{BeadStack, Pushed};
use crate::text::LineDiff;
use crate::tree::save_tree;
use crate::typing::{
    Granularity, MergeQuery, PreviousTyping, WhitespaceBoundary, WordBoundary, needs_new_bead,
};

/// Label when there is nothing to undo.
pub const CANT_UNDO: &str = "Can't Undo";
/// Label when there is nothing to redo.
pub const CANT_REDO: &str = "Can't Redo";
/// Label of typing beads.
pub const TYPING: &str = "Typing";

/// Menu text for an undo label.
#[must_use]
pub fn undo_menu_name(label: &str) -> String {
    if label == CANT_UNDO {
        label.to_string()
    } else {
        format!("Undo {label}")
    }
}

/// Menu text for a redo label.
#[must_use]
pub fn redo_menu_name(label: &str) -> String {
    if label == CANT_REDO {
        label.to_string()
    } else {
        format!("Redo {label}")
    }
}

fn label(undo_type: &str) -> String {
    if undo_type.is_empty() {
        tracing::warn!(target: "beadline.undo", "empty undo label, recording as <unknown>");
        "<unknown>".to_string()
    } else {
        undo_type.to_string()
    }
}

fn is_typing_label(undo_type: &str) -> bool {
    undo_type == TYPING
}

/// What the undoer is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayState {
    #[default]
    Idle,
    Undoing,
    Redoing,
}

impl ReplayState {
    #[must_use]
    pub const fn is_replaying(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Result of [`Undoer::undo`] or [`Undoer::redo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// Nothing was available to replay.
    Nothing,
    Replayed {
        undo_type: String,
        /// Leaf operations applied; more than one for groups.
        items: usize,
    },
}

/// One typing edit, as reported by the body editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEdit<'a> {
    pub undo_type: &'a str,
    pub old_text: &'a str,
    pub new_text: &'a str,
    pub old_sel: Option<Selection>,
    pub new_sel: Option<Selection>,
    pub old_y_scroll: Option<i32>,
}

impl<'a> TypingEdit<'a> {
    #[must_use]
    pub fn new(old_text: &'a str, new_text: &'a str) -> Self {
        Self {
            undo_type: TYPING,
            old_text,
            new_text,
            old_sel: None,
            new_sel: None,
            old_y_scroll: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, undo_type: &'a str) -> Self {
        self.undo_type = undo_type;
        self
    }

    #[must_use]
    pub fn with_selections(mut self, old_sel: Selection, new_sel: Selection) -> Self {
        self.old_sel = Some(old_sel);
        self.new_sel = Some(new_sel);
        self
    }

    #[must_use]
    pub fn with_y_scroll(mut self, y: i32) -> Self {
        self.old_y_scroll = Some(y);
        self
    }
}

/// Unlimited undo/redo for one outline.
pub struct Undoer {
    config: UndoConfig,
    stack: BeadStack,
    undo_type: String,
    redo_type: String,
    state: ReplayState,
    /// Caret after the previous keystroke, for word granularity.
    prev_sel: Option<Selection>,
    word_boundary: Box<dyn WordBoundary>,
}

impl fmt::Debug for Undoer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Undoer")
            .field("config", &self.config)
            .field("beads", &self.stack.len())
            .field("cursor", &self.stack.cursor())
            .field("undo_type", &self.undo_type)
            .field("redo_type", &self.redo_type)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for Undoer {
    fn default() -> Self {
        Self::new(UndoConfig::default())
    }
}

impl Undoer {
    #[must_use]
    pub fn new(config: UndoConfig) -> Self {
        Self {
            stack: BeadStack::new(config.max_stack_size),
            config,
            undo_type: CANT_UNDO.to_string(),
            redo_type: CANT_REDO.to_string(),
            state: ReplayState::Idle,
            prev_sel: None,
            word_boundary: Box::new(WhitespaceBoundary),
        }
    }

    /// Replace the word-boundary rule used by word granularity.
    #[must_use]
    pub fn with_word_boundary(mut self, boundary: impl WordBoundary + 'static) -> Self {
        self.word_boundary = Box::new(boundary);
        self
    }

    /// Apply new settings. A smaller cap takes effect immediately.
    pub fn reload_settings(&mut self, config: UndoConfig) {
        tracing::debug!(
            target: "beadline.undo",
            granularity = %config.granularity,
            max_stack_size = config.max_stack_size,
            "reloaded undo settings"
        );
        self.stack.set_max_size(config.max_stack_size);
        self.config = config;
        self.set_undo_types();
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[must_use]
    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.config.granularity
    }

    #[must_use]
    pub fn state(&self) -> ReplayState {
        self.state
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_type != CANT_UNDO
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.redo_type != CANT_REDO
    }

    #[must_use]
    pub fn undo_type(&self) -> &str {
        &self.undo_type
    }

    #[must_use]
    pub fn redo_type(&self) -> &str {
        &self.redo_type
    }

    #[must_use]
    pub fn undo_menu_label(&self) -> String {
        undo_menu_name(&self.undo_type)
    }

    #[must_use]
    pub fn redo_menu_label(&self) -> String {
        redo_menu_name(&self.redo_type)
    }

    /// `(undo enabled, redo enabled)` for the Edit menu.
    #[must_use]
    pub fn enable_menu_items(&self) -> (bool, bool) {
        (self.can_undo(), self.can_redo())
    }

    #[must_use]
    pub fn beads(&self) -> &[Bead] {
        self.stack.beads()
    }

    /// Index of the bead the next undo replays.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.stack.cursor()
    }

    #[must_use]
    pub fn peek_bead(&self, n: usize) -> Option<&Bead> {
        self.stack.peek(n)
    }

    /// JSON summary of bead `n`.
    #[must_use]
    pub fn dump_bead(&self, n: usize) -> Option<String> {
        let bead = self.stack.peek(n)?;
        let summary = serde_json::json!({
            "index": n,
            "len": self.stack.len(),
            "cursor": self.stack.cursor(),
            "kind": bead.kind_name(),
            "undo_type": bead.undo_type,
            "p": bead.p,
            "items": bead.group().map(|g| g.items.len()),
            "leaves": bead.leaf_count(),
        });
        Some(summary.to_string())
    }

    /// JSON summary of the last bead in the history.
    #[must_use]
    pub fn dump_top_bead(&self) -> Option<String> {
        self.dump_bead(self.stack.len().checked_sub(1)?)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Forget all history.
    pub fn clear_undo_state(&mut self) {
        self.stack.clear();
        self.prev_sel = None;
        self.set_undo_types();
        tracing::debug!(target: "beadline.undo", "cleared undo state");
    }

    /// Trim the history to the configured cap and recompute the menu labels.
    pub fn set_undo_types(&mut self) {
        self.cut_stack();
        self.undo_type = self
            .stack
            .top()
            .map_or_else(|| CANT_UNDO.to_string(), |b| b.undo_type.clone());
        self.redo_type = self
            .stack
            .next_redo()
            .map_or_else(|| CANT_REDO.to_string(), |b| b.undo_type.clone());
    }

    /// Drop the oldest beads beyond the configured cap. Returns how many were dropped.
    pub fn cut_stack(&mut self) -> usize {
        let dropped = self.stack.cut();
        if dropped > 0 {
            tracing::debug!(
                target: "beadline.undo",
                dropped,
                remaining = self.stack.len(),
                "trimmed undo history"
            );
        }
        dropped
    }

    fn push(&mut self, bead: Bead) {
        let kind = bead.kind_name();
        match self.stack.push(bead) {
            Pushed::TopLevel => {
                tracing::debug!(target: "beadline.undo", kind, len = self.stack.len(), "pushed bead");
                self.set_undo_types();
            }
            Pushed::IntoGroup => {
                tracing::debug!(target: "beadline.undo", kind, "appended bead to open group");
            }
        }
    }

    fn finish<D: Document + ?Sized>(
        doc: &D,
        common: CommonData,
        undo_type: &str,
        kind: BeadKind,
    ) -> Bead {
        Bead {
            undo_type: label(undo_type),
            new_marked: doc.is_marked(common.p.v()),
            new_sel: Some(doc.selection()),
            old_marked: common.old_marked,
            old_sel: common.old_sel,
            p: common.p,
            dirty: common.dirty,
            kind,
        }
    }

    fn record<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        common: CommonData,
        undo_type: &str,
        kind: BeadKind,
    ) {
        if self.state.is_replaying() {
            return;
        }
        let bead = Self::finish(doc, common, undo_type, kind);
        self.push(bead);
    }

    // ========================================================================
    // Content changes
    // ========================================================================

    pub fn before_change_node_contents<D: Document + ?Sized>(
        &self,
        doc: &D,
        p: &Position,
    ) -> NodeUndoData {
        NodeUndoData {
            common: CommonData::capture(doc, p),
            old_head: doc.head(p.v()).to_string(),
            old_body: doc.body(p.v()).to_string(),
        }
    }

    pub fn after_change_node_contents<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        undo_type: &str,
        data: NodeUndoData,
    ) {
        let change = content_change(doc, &data);
        self.record(doc, data.common, undo_type, BeadKind::Node(change));
    }

    /// Like [`Undoer::before_change_node_contents`], for commands that rewrite a body.
    pub fn before_change_body<D: Document + ?Sized>(&self, doc: &D, p: &Position) -> NodeUndoData {
        self.before_change_node_contents(doc, p)
    }

    pub fn after_change_body<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        undo_type: &str,
        data: NodeUndoData,
    ) {
        if is_typing_label(undo_type) {
            tracing::warn!(
                target: "beadline.undo",
                "body change recorded with the Typing label; use set_undo_typing_params"
            );
        }
        let change = content_change(doc, &data);
        self.record(doc, data.common, undo_type, BeadKind::Body(change));
    }

    pub fn before_change_headline<D: Document + ?Sized>(
        &self,
        doc: &D,
        p: &Position,
    ) -> NodeUndoData {
        self.before_change_node_contents(doc, p)
    }

    pub fn after_change_headline<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        undo_type: &str,
        data: NodeUndoData,
    ) {
        let change = HeadlineChange {
            new_head: doc.head(data.common.p.v()).to_string(),
            old_head: data.old_head,
        };
        self.record(doc, data.common, undo_type, BeadKind::Headline(change));
    }

    pub fn before_change_tree<D: Document + ?Sized>(&self, doc: &D, p: &Position) -> TreeUndoData {
        TreeUndoData {
            common: CommonData::capture(doc, p),
            old_tree: save_tree(doc, p),
        }
    }

    /// The after-snapshot is taken lazily on first undo.
    pub fn after_change_tree<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        undo_type: &str,
        data: TreeUndoData,
    ) {
        let change = TreeChange {
            old_tree: data.old_tree,
            new_tree: None,
        };
        self.record(doc, data.common, undo_type, BeadKind::Tree(change));
    }

    // ========================================================================
    // Typing
    // ========================================================================

    /// Record a typing edit to `p`'s body and apply `edit.new_text` to the document.
    ///
    /// Consecutive edits may extend the top typing bead instead of pushing a
    /// new one; see [`crate::typing`].
    pub fn set_undo_typing_params<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        p: &Position,
        edit: TypingEdit<'_>,
    ) -> Result<()> {
        if self.state.is_replaying() {
            return Ok(());
        }
        if edit.undo_type == CANT_UNDO {
            self.clear_undo_state();
            return Ok(());
        }
        if edit.old_text == edit.new_text {
            self.set_undo_types();
            return Ok(());
        }

        let v = p.v();
        let diff = LineDiff::compute(edit.old_text, edit.new_text);
        let previous = self
            .stack
            .top()
            .filter(|b| is_typing_label(&b.undo_type) && is_typing_label(edit.undo_type))
            .and_then(|b| match &b.kind {
                BeadKind::Typing(t) => Some(PreviousTyping {
                    v: b.p.v(),
                    leading: t.leading,
                    trailing: t.trailing,
                }),
                _ => None,
            });
        let new_bead = needs_new_bead(
            &MergeQuery {
                granularity: self.config.granularity,
                v,
                diff: &diff,
                previous,
                old_text: edit.old_text,
                new_text: edit.new_text,
                old_sel: edit.old_sel,
                new_sel: edit.new_sel,
                prev_sel: self.prev_sel,
            },
            self.word_boundary.as_ref(),
        );
        self.prev_sel = edit.new_sel;

        let mut dirty = clean_at_file_ancestors(doc, v);
        if !dirty.contains(&v) {
            dirty.push(v);
        }
        let marked = doc.is_marked(v);
        let y_scroll = doc.y_scroll();

        if new_bead {
            let change = TypingChange {
                leading: diff.leading,
                trailing: diff.trailing,
                old_middle: diff.old_middle,
                new_middle: diff.new_middle,
                old_newlines: diff.old_newlines,
                new_newlines: diff.new_newlines,
                old_y_scroll: edit.old_y_scroll.or(Some(y_scroll)),
                new_y_scroll: Some(y_scroll),
            };
            let bead = Bead {
                undo_type: label(edit.undo_type),
                p: p.clone(),
                old_marked: marked,
                new_marked: marked,
                old_sel: edit.old_sel,
                new_sel: edit.new_sel,
                dirty,
                kind: BeadKind::Typing(change),
            };
            self.push(bead);
        } else {
            self.stack.truncate_redo();
            if let Some(bead) = self.stack.top_mut()
                && let BeadKind::Typing(t) = &mut bead.kind
            {
                // The live text is the top bead's after-state, so its before-state
                // can be rebuilt and diffed against the new text.
                let base = crate::text::reconstruct(
                    edit.old_text,
                    t.leading,
                    t.trailing,
                    &t.old_middle,
                    t.old_newlines,
                );
                let merged = LineDiff::compute(&base, edit.new_text);
                t.leading = merged.leading;
                t.trailing = merged.trailing;
                t.old_middle = merged.old_middle;
                t.new_middle = merged.new_middle;
                t.old_newlines = merged.old_newlines;
                t.new_newlines = merged.new_newlines;
                t.new_y_scroll = Some(y_scroll);
                bead.new_sel = edit.new_sel;
                bead.new_marked = marked;
                for d in dirty {
                    if !bead.dirty.contains(&d) {
                        bead.dirty.push(d);
                    }
                }
                tracing::debug!(target: "beadline.undo", "merged typing into top bead");
            }
            self.set_undo_types();
        }

        doc.set_body(v, edit.new_text)?;
        doc.set_dirty(v)?;
        doc.set_changed(true);
        Ok(())
    }

    // ========================================================================
    // Structure changes
    // ========================================================================

    /// `paste_as_clone` lists the vnodes whose text a paste-as-clone overwrites.
    pub fn before_insert_node<D: Document + ?Sized>(
        &self,
        doc: &D,
        p: &Position,
        paste_as_clone: Option<&[NodeId]>,
    ) -> InsertUndoData {
        InsertUndoData {
            common: CommonData::capture(doc, p),
            paste_before: paste_as_clone
                .map(|nodes| nodes.iter().map(|&v| node_text(doc, v)).collect()),
        }
    }

    pub fn after_insert_node<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        new_p: &Position,
        undo_type: &str,
        data: InsertUndoData,
    ) {
        let paste_as_clone = data.paste_before.map(|before| PasteAsClone {
            after: before.iter().map(|t| node_text(doc, t.v)).collect(),
            before,
        });
        let change = InsertChange {
            new_p: new_p.clone(),
            new_back: doc.back(new_p),
            new_parent: doc.parent(new_p),
            paste_as_clone,
        };
        self.record(doc, data.common, undo_type, BeadKind::Insert(change));
    }

    pub fn before_delete_node<D: Document + ?Sized>(
        &self,
        doc: &D,
        p: &Position,
    ) -> DeleteUndoData {
        DeleteUndoData {
            common: CommonData::capture(doc, p),
            old_back: doc.back(p),
            old_parent: doc.parent(p),
        }
    }

    /// Call after the delete; the document's current position is recorded as
    /// the selection to restore on redo.
    pub fn after_delete_node<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        undo_type: &str,
        data: DeleteUndoData,
    ) {
        let change = DeleteChange {
            old_back: data.old_back,
            old_parent: data.old_parent,
            new_p: doc.current(),
        };
        self.record(doc, data.common, undo_type, BeadKind::Delete(change));
    }

    pub fn before_move_node<D: Document + ?Sized>(&self, doc: &D, p: &Position) -> MoveUndoData {
        MoveUndoData {
            common: CommonData::capture(doc, p),
            old_n: p.child_index(),
            old_parent_v: doc.parent_node(p),
        }
    }

    pub fn after_move_node<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        new_p: &Position,
        undo_type: &str,
        data: MoveUndoData,
    ) {
        let change = MoveChange {
            old_n: data.old_n,
            old_parent_v: data.old_parent_v,
            new_n: new_p.child_index(),
            new_parent_v: doc.parent_node(new_p),
            new_p: new_p.clone(),
        };
        self.record(doc, data.common, undo_type, BeadKind::Move(change));
    }

    pub fn before_clone_node<D: Document + ?Sized>(&self, doc: &D, p: &Position) -> CloneUndoData {
        CloneUndoData {
            common: CommonData::capture(doc, p),
        }
    }

    pub fn after_clone_node<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        clone_p: &Position,
        undo_type: &str,
        data: CloneUndoData,
    ) {
        let change = CloneChange {
            new_p: clone_p.clone(),
            new_back: doc.back(clone_p),
            new_parent: doc.parent(clone_p),
        };
        self.record(doc, data.common, undo_type, BeadKind::Clone(change));
    }

    pub fn before_mark<D: Document + ?Sized>(
        &self,
        doc: &D,
        p: &Position,
        undo_type: &str,
    ) -> MarkUndoData {
        MarkUndoData {
            common: CommonData::capture(doc, p),
            undo_type: undo_type.to_string(),
        }
    }

    pub fn after_mark<D: Document + ?Sized>(&mut self, doc: &D, data: MarkUndoData) {
        self.record(doc, data.common, &data.undo_type, BeadKind::Mark);
    }

    /// `p` is one of the sorted siblings. With `sort_children`, the sort was
    /// of `p`'s parent's children as a whole and replay selects the parent.
    pub fn before_sort<D: Document + ?Sized>(
        &self,
        doc: &D,
        p: &Position,
        undo_type: &str,
        old_children: Vec<NodeId>,
        new_children: Vec<NodeId>,
        sort_children: bool,
    ) -> SortUndoData {
        SortUndoData {
            common: CommonData::capture(doc, p),
            undo_type: undo_type.to_string(),
            old_children,
            new_children,
            sort_children,
        }
    }

    pub fn after_sort<D: Document + ?Sized>(&mut self, doc: &D, data: SortUndoData) {
        let change = SortChange {
            old_children: data.old_children,
            new_children: data.new_children,
            sort_children: data.sort_children,
        };
        self.record(doc, data.common, &data.undo_type, BeadKind::Sort(change));
    }

    pub fn after_demote<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        p: &Position,
        following_sibs: Vec<NodeId>,
    ) {
        let common = CommonData::capture(doc, p);
        self.record(doc, common, "Demote", BeadKind::Demote(DemoteChange { following_sibs }));
    }

    pub fn after_promote<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        p: &Position,
        children: Vec<NodeId>,
    ) {
        let common = CommonData::capture(doc, p);
        self.record(doc, common, "Promote", BeadKind::Promote(PromoteChange { children }));
    }

    pub fn after_hoist<D: Document + ?Sized>(&mut self, doc: &D, p: &Position, undo_type: &str) {
        let common = CommonData::capture(doc, p);
        self.record(doc, common, undo_type, BeadKind::Hoist);
    }

    pub fn after_dehoist<D: Document + ?Sized>(&mut self, doc: &D, p: &Position, undo_type: &str) {
        let common = CommonData::capture(doc, p);
        self.record(doc, common, undo_type, BeadKind::Dehoist);
    }

    pub fn before_clear_recent_files<D: Document + ?Sized>(
        &self,
        doc: &D,
    ) -> Result<RecentFilesUndoData> {
        let p = doc.current().ok_or(UndoError::NoCurrentPosition)?;
        Ok(RecentFilesUndoData {
            common: CommonData::capture(doc, &p),
            old_files: doc.recent_files().to_vec(),
        })
    }

    pub fn after_clear_recent_files<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        data: RecentFilesUndoData,
    ) {
        let change = RecentFilesChange {
            old_files: data.old_files,
            new_files: doc.recent_files().to_vec(),
        };
        self.record(
            doc,
            data.common,
            "Clear Recent Files",
            BeadKind::ClearRecentFiles(change),
        );
    }

    // ========================================================================
    // Bulk marked-node commands
    // ========================================================================

    /// `p` is the position that was current when the command ran.
    pub fn after_delete_marked_nodes<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        p: &Position,
        deleted: Vec<Position>,
    ) {
        let mut common = CommonData::capture(doc, p);
        for q in &deleted {
            let parent_v = q.parent_v().unwrap_or_else(|| doc.hidden_root());
            if parent_v != doc.hidden_root() && !common.dirty.contains(&parent_v) {
                common.dirty.push(parent_v);
            }
        }
        let change = DeleteMarkedChange {
            deleted,
            new_p: doc.current(),
        };
        self.record(
            doc,
            common,
            "Delete Marked Nodes",
            BeadKind::DeleteMarkedNodes(change),
        );
    }

    pub fn after_move_marked_nodes<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        p: &Position,
        moved: MovedMarked,
    ) {
        let common = CommonData::capture(doc, p);
        let change = MoveMarkedChange {
            container: moved.container,
            moved: moved.moved,
        };
        self.record(
            doc,
            common,
            "Move Marked Nodes",
            BeadKind::MoveMarkedNodes(change),
        );
    }

    /// `p` is the position the container was inserted after.
    pub fn after_clone_marked_nodes<D: Document + ?Sized>(&mut self, doc: &D, p: &Position) {
        let common = CommonData::capture(doc, p);
        let change = MarkedContainerChange {
            container: doc.next(p),
        };
        self.record(
            doc,
            common,
            "Clone Marked Nodes",
            BeadKind::CloneMarkedNodes(change),
        );
    }

    /// `p` is the position the container was inserted after.
    pub fn after_copy_marked_nodes<D: Document + ?Sized>(&mut self, doc: &D, p: &Position) {
        let common = CommonData::capture(doc, p);
        let change = MarkedContainerChange {
            container: doc.next(p),
        };
        self.record(
            doc,
            common,
            "Copy Marked Nodes",
            BeadKind::CopyMarkedNodes(change),
        );
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Open a group. Beads recorded until the matching
    /// [`Undoer::after_change_group`] become its items.
    pub fn before_change_group<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        p: &Position,
        undo_type: &str,
    ) {
        let verbose = self.config.verbose_groups;
        self.before_change_group_verbose(doc, p, undo_type, verbose);
    }

    /// Like [`Undoer::before_change_group`] with explicit verbosity.
    pub fn before_change_group_verbose<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        p: &Position,
        undo_type: &str,
        verbose: bool,
    ) {
        if self.state.is_replaying() {
            return;
        }
        let common = CommonData::capture(doc, p);
        let bead = Bead {
            undo_type: label(undo_type),
            new_marked: common.old_marked,
            new_sel: None,
            old_marked: common.old_marked,
            old_sel: common.old_sel,
            p: common.p,
            dirty: common.dirty,
            kind: BeadKind::Group(GroupChange {
                state: GroupState::Open,
                items: Vec::new(),
                verbose,
                report_flag: false,
                new_p: None,
            }),
        };
        let pushed = self.stack.push(bead);
        tracing::debug!(
            target: "beadline.undo",
            label = undo_type,
            nested = pushed == Pushed::IntoGroup,
            "opened group"
        );
        if pushed == Pushed::TopLevel {
            self.set_undo_types();
        }
    }

    /// Close the innermost open group.
    pub fn after_change_group<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        p: &Position,
        undo_type: &str,
        report_flag: bool,
    ) -> Result<()> {
        if self.state.is_replaying() {
            return Ok(());
        }
        let Some(bead) = self.stack.top_mut().and_then(innermost_open_group) else {
            let found = self
                .stack
                .top()
                .map_or("nothing", Bead::kind_name)
                .to_string();
            tracing::error!(target: "beadline.undo", found = %found, "no open group to close");
            return Err(UndoError::MismatchedGroup { found });
        };
        let items = match &mut bead.kind {
            BeadKind::Group(group) => {
                group.state = GroupState::Closed;
                group.report_flag = report_flag;
                group.new_p = Some(p.clone());
                group.items.len()
            }
            _ => return Err(UndoError::inconsistency("after_change_group", "not a group")),
        };
        bead.undo_type = label(undo_type);
        bead.new_marked = doc.is_marked(p.v());
        bead.new_sel = Some(doc.selection());
        tracing::debug!(target: "beadline.undo", label = undo_type, items, "closed group");
        self.set_undo_types();
        Ok(())
    }

    // ========================================================================
    // Replay
    // ========================================================================

    /// Undo the bead at the cursor.
    pub fn undo<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<ReplayOutcome> {
        let Some(index) = self.replay_target(doc, Direction::Undo) else {
            return Ok(ReplayOutcome::Nothing);
        };
        let outcome = self.replay(index, Direction::Undo, doc)?;
        self.stack.retreat();
        self.set_undo_types();
        Ok(outcome)
    }

    /// Redo the bead after the cursor.
    pub fn redo<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<ReplayOutcome> {
        let Some(index) = self.replay_target(doc, Direction::Redo) else {
            return Ok(ReplayOutcome::Nothing);
        };
        let outcome = self.replay(index, Direction::Redo, doc)?;
        self.stack.advance();
        self.set_undo_types();
        Ok(outcome)
    }

    fn replay_target<D: Document + ?Sized>(&self, doc: &D, dir: Direction) -> Option<usize> {
        if self.state.is_replaying() {
            return None;
        }
        if doc.current().is_none() {
            tracing::debug!(
                target: "beadline.undo",
                direction = dir.as_str(),
                "no current position"
            );
            return None;
        }
        match dir {
            Direction::Undo if self.can_undo() => self.stack.cursor(),
            Direction::Redo if self.can_redo() => Some(self.stack.cursor().map_or(0, |c| c + 1)),
            _ => None,
        }
    }

    fn replay<D: Document + ?Sized>(
        &mut self,
        index: usize,
        dir: Direction,
        doc: &mut D,
    ) -> Result<ReplayOutcome> {
        let Some(bead) = self.stack.peek_mut(index) else {
            return Err(UndoError::EmptyStack);
        };
        self.state = match dir {
            Direction::Undo => ReplayState::Undoing,
            Direction::Redo => ReplayState::Redoing,
        };
        let undo_type = bead.undo_type.clone();
        let mut ctx = ReplayContext::default();
        let result = replay_bead(bead, dir, doc, &mut ctx).and_then(|items| {
            doc.set_changed(true);
            doc.check_outline()
                .map_err(|e| UndoError::inconsistency("check_outline", e.to_string()))?;
            Ok(items)
        });
        self.state = ReplayState::Idle;
        match result {
            Ok(items) => {
                tracing::debug!(
                    target: "beadline.undo",
                    direction = dir.as_str(),
                    label = %undo_type,
                    items,
                    "replay finished"
                );
                Ok(ReplayOutcome::Replayed { undo_type, items })
            }
            Err(err) => {
                tracing::error!(
                    target: "beadline.undo",
                    direction = dir.as_str(),
                    label = %undo_type,
                    error = %err,
                    "replay failed"
                );
                Err(err)
            }
        }
    }
}

fn content_change<D: Document + ?Sized>(doc: &D, data: &NodeUndoData) -> ContentChange {
    let v = data.common.p.v();
    ContentChange {
        old_head: data.old_head.clone(),
        old_body: data.old_body.clone(),
        old_y_scroll: data.common.old_y_scroll,
        new_head: doc.head(v).to_string(),
        new_body: doc.body(v).to_string(),
        new_y_scroll: doc.y_scroll(),
    }
}

// ============================================================================
// Tests
// ============================================================================
