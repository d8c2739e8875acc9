#![forbid(unsafe_code)]

//! End-to-end undo/redo scenarios against an in-memory outline.
//!
//! Covers:
//! (1) Content, headline, and tree changes round trip
//! (2) Structure edits: insert, delete, move, clone, sort, demote, promote
//! (3) Hoist, mark, and recent-file commands
//! (4) Bulk marked-node commands
//! (5) Groups, nesting, and mismatched closes
//! (6) History cap and failure handling
//!
//! Run:
//!   cargo test -p beadline-undo --test undo_redo_scenarios

use beadline_outline::{CLONES_CONTAINER, COPIES_CONTAINER, Document, MOVED_CONTAINER, Outline, Position};
use beadline_undo::{
    CANT_REDO, CANT_UNDO, GroupState, ReplayOutcome, ReplayState, UndoConfig, UndoError, Undoer,
};

// ============================================================================
// Helpers
// ============================================================================

/// Top-level `A`, `B`, `C`.
fn abc() -> (Outline, Position, Position, Position) {
    let mut o = Outline::new();
    let a = o.insert_as_last_child(None, "A").unwrap();
    let b = o.insert_as_last_child(None, "B").unwrap();
    let c = o.insert_as_last_child(None, "C").unwrap();
    (o, a, b, c)
}

fn replayed(label: &str, items: usize) -> ReplayOutcome {
    ReplayOutcome::Replayed {
        undo_type: label.to_string(),
        items,
    }
}

/// Undo then redo, checking the rendering on each side.
fn assert_round_trip(u: &mut Undoer, o: &mut Outline, before: &str, after: &str) {
    assert!(u.undo(o).unwrap() != ReplayOutcome::Nothing);
    assert_eq!(o.render(), before, "undo did not restore the outline");
    assert!(o.check_outline().is_ok());
    assert!(u.redo(o).unwrap() != ReplayOutcome::Nothing);
    assert_eq!(o.render(), after, "redo did not reapply the change");
    assert!(o.check_outline().is_ok());
}

// ============================================================================
// Content
// ============================================================================

#[test]
fn body_change_round_trip() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();

    let data = u.before_change_body(&o, &a);
    o.set_body(a.v(), "hello").unwrap();
    u.after_change_body(&o, "Change Body", data);

    assert_eq!(u.undo_type(), "Change Body");
    assert_eq!(u.undo_menu_label(), "Undo Change Body");
    assert_eq!(u.redo_type(), CANT_REDO);

    assert_eq!(u.undo(&mut o).unwrap(), replayed("Change Body", 1));
    assert_eq!(o.body(a.v()), "");
    assert_eq!(u.undo_type(), CANT_UNDO);
    assert_eq!(u.redo_menu_label(), "Redo Change Body");

    assert_eq!(u.redo(&mut o).unwrap(), replayed("Change Body", 1));
    assert_eq!(o.body(a.v()), "hello");
    assert!(u.can_undo());
    assert!(!u.can_redo());
}

#[test]
fn headline_change_round_trip() {
    let (mut o, _, b, _) = abc();
    let mut u = Undoer::default();

    let data = u.before_change_headline(&o, &b);
    o.set_head(b.v(), "Renamed").unwrap();
    u.after_change_headline(&o, "Change Headline", data);

    u.undo(&mut o).unwrap();
    assert_eq!(o.head(b.v()), "B");
    assert_eq!(o.current(), Some(b.clone()));
    u.redo(&mut o).unwrap();
    assert_eq!(o.head(b.v()), "Renamed");
}

#[test]
fn node_contents_restore_scroll() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();
    o.set_y_scroll(3);

    let data = u.before_change_node_contents(&o, &a);
    o.set_head(a.v(), "A2").unwrap();
    o.set_body(a.v(), "body").unwrap();
    o.set_y_scroll(9);
    u.after_change_node_contents(&o, "Change Node", data);

    u.undo(&mut o).unwrap();
    assert_eq!((o.head(a.v()), o.body(a.v())), ("A", ""));
    assert_eq!(o.y_scroll(), 3);
    u.redo(&mut o).unwrap();
    assert_eq!((o.head(a.v()), o.body(a.v())), ("A2", "body"));
    assert_eq!(o.y_scroll(), 9);
}

#[test]
fn tree_change_snapshots_lazily() {
    let (mut o, a, _, _) = abc();
    let child = o.insert_as_last_child(Some(&a), "child").unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    let data = u.before_change_tree(&o, &a);
    o.set_body(a.v(), "parent text").unwrap();
    o.set_head(child.v(), "renamed child").unwrap();
    u.after_change_tree(&o, "Change Tree", data);
    let after = o.render();

    match &u.peek_bead(0).unwrap().kind {
        beadline_undo::BeadKind::Tree(t) => assert!(t.new_tree.is_none()),
        other => panic!("expected a tree bead, got {other:?}"),
    }
    assert_round_trip(&mut u, &mut o, &before, &after);
    match &u.peek_bead(0).unwrap().kind {
        beadline_undo::BeadKind::Tree(t) => assert!(t.new_tree.is_some()),
        other => panic!("expected a tree bead, got {other:?}"),
    }
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn insert_round_trip() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();
    let before = o.render();

    let data = u.before_insert_node(&o, &a, None);
    let new_p = o.insert_after(&a, "new").unwrap();
    o.select_position(&new_p);
    u.after_insert_node(&o, &new_p, "Insert Node", data);
    let after = o.render();

    u.undo(&mut o).unwrap();
    assert_eq!(o.render(), before);
    assert_eq!(o.current(), Some(a.clone()));
    u.redo(&mut o).unwrap();
    assert_eq!(o.render(), after);
    assert_eq!(o.current().map(|p| p.child_index()), Some(1));
}

#[test]
fn paste_as_clone_restores_texts() {
    let (mut o, _, b, _) = abc();
    o.set_body(b.v(), "original").unwrap();
    let mut u = Undoer::default();

    let data = u.before_insert_node(&o, &b, Some(&[b.v()]));
    o.set_body(b.v(), "pasted").unwrap();
    let pasted = o.clone_node(&b).unwrap();
    u.after_insert_node(&o, &pasted, "Paste Node", data);

    u.undo(&mut o).unwrap();
    assert_eq!(o.body(b.v()), "original");
    assert_eq!(o.children(o.hidden_root()).len(), 3);
    u.redo(&mut o).unwrap();
    assert_eq!(o.body(b.v()), "pasted");
    assert_eq!(o.children(o.hidden_root()).len(), 4);
}

#[test]
fn delete_round_trip() {
    let (mut o, _, b, _) = abc();
    o.insert_as_last_child(Some(&b), "B1").unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    let data = u.before_delete_node(&o, &b);
    o.delete_position(&b).unwrap();
    u.after_delete_node(&o, "Delete Node", data);
    let after = o.render();
    assert_eq!(o.headlines(), ["A", "C"]);

    u.undo(&mut o).unwrap();
    assert_eq!(o.render(), before);
    assert_eq!(o.current(), Some(b.clone()));
    u.redo(&mut o).unwrap();
    assert_eq!(o.render(), after);
    assert_eq!(o.current().map(|p| o.head(p.v()).to_string()), Some("A".to_string()));
}

#[test]
fn delete_first_child_relinks_under_parent() {
    let (mut o, a, _, _) = abc();
    let a1 = o.insert_as_last_child(Some(&a), "A1").unwrap();
    o.insert_as_last_child(Some(&a), "A2").unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    let data = u.before_delete_node(&o, &a1);
    o.delete_position(&a1).unwrap();
    u.after_delete_node(&o, "Delete Node", data);
    let after = o.render();

    assert_round_trip(&mut u, &mut o, &before, &after);
}

#[test]
fn move_round_trip() {
    let (mut o, a, _, c) = abc();
    let mut u = Undoer::default();
    let before = o.render();

    let data = u.before_move_node(&o, &c);
    let moved = o.move_to_nth_child(&c, Some(&a), 0).unwrap();
    u.after_move_node(&o, &moved, "Move Node", data);
    let after = o.render();
    assert_eq!(o.children(a.v()), [c.v()]);

    u.undo(&mut o).unwrap();
    assert_eq!(o.render(), before);
    assert_eq!(o.current(), Some(c.clone()));
    u.redo(&mut o).unwrap();
    assert_eq!(o.render(), after);
    assert_eq!(o.current(), Some(moved));
}

#[test]
fn clone_round_trip() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();
    let before = o.render();

    let data = u.before_clone_node(&o, &a);
    let clone = o.clone_node(&a).unwrap();
    u.after_clone_node(&o, &clone, "Clone Node", data);
    let after = o.render();
    assert_eq!(o.node(a.v()).unwrap().clone_count(), 2);

    assert_round_trip(&mut u, &mut o, &before, &after);
    u.undo(&mut o).unwrap();
    assert_eq!(o.node(a.v()).unwrap().clone_count(), 1);
}

#[test]
fn sort_round_trip() {
    let (mut o, a, _, _) = abc();
    for head in ["cherry", "Apple", "banana"] {
        o.insert_as_last_child(Some(&a), head).unwrap();
    }
    let first = o.first_child(&a).unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    let old_children = o.children(a.v()).to_vec();
    let mut new_children = old_children.clone();
    new_children.sort_by_key(|&v| o.head(v).to_lowercase());
    let data = u.before_sort(&o, &first, "Sort Children", old_children, new_children, true);
    o.sort_siblings(&first).unwrap();
    u.after_sort(&o, data);
    let after = o.render();

    u.undo(&mut o).unwrap();
    assert_eq!(o.render(), before);
    assert_eq!(o.current(), Some(a.clone()));
    u.redo(&mut o).unwrap();
    assert_eq!(o.render(), after);
}

#[test]
fn demote_then_promote_round_trip() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();
    let start = o.render();

    let following = o.demote(&a).unwrap();
    u.after_demote(&o, &a, following);
    let demoted = o.render();
    assert_eq!(o.children(o.hidden_root()).len(), 1);

    let children = o.promote(&a).unwrap();
    u.after_promote(&o, &a, children);
    assert_eq!(o.render(), start);

    u.undo(&mut o).unwrap();
    assert_eq!(o.render(), demoted);
    u.undo(&mut o).unwrap();
    assert_eq!(o.render(), start);
    assert_eq!(u.redo(&mut o).unwrap(), replayed("Demote", 1));
    assert_eq!(o.render(), demoted);
    assert_eq!(u.redo(&mut o).unwrap(), replayed("Promote", 1));
    assert_eq!(o.render(), start);
}

// ============================================================================
// Hoist, mark, recent files
// ============================================================================

#[test]
fn hoist_and_dehoist_round_trip() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();

    o.hoist().unwrap();
    u.after_hoist(&o, &a, "Hoist");
    assert_eq!(o.hoist_depth(), 1);

    u.undo(&mut o).unwrap();
    assert_eq!(o.hoist_depth(), 0);
    u.redo(&mut o).unwrap();
    assert_eq!(o.hoist_depth(), 1);

    o.dehoist().unwrap();
    u.after_dehoist(&o, &a, "De-Hoist");
    u.undo(&mut o).unwrap();
    assert_eq!(o.hoist_depth(), 1);
}

#[test]
fn mark_round_trip() {
    let (mut o, _, b, _) = abc();
    let mut u = Undoer::default();

    let data = u.before_mark(&o, &b, "Mark");
    o.set_marked(b.v(), true).unwrap();
    u.after_mark(&o, data);

    u.undo(&mut o).unwrap();
    assert!(!o.is_marked(b.v()));
    u.redo(&mut o).unwrap();
    assert!(o.is_marked(b.v()));
}

#[test]
fn clear_recent_files_round_trip() {
    let (mut o, _, _, _) = abc();
    let files = vec!["notes.leo".to_string(), "work.leo".to_string()];
    o.set_recent_files(files.clone());
    let mut u = Undoer::default();

    let data = u.before_clear_recent_files(&o).unwrap();
    o.set_recent_files(Vec::new());
    u.after_clear_recent_files(&o, data);
    assert_eq!(u.undo_type(), "Clear Recent Files");

    u.undo(&mut o).unwrap();
    assert_eq!(o.recent_files(), files.as_slice());
    u.redo(&mut o).unwrap();
    assert!(o.recent_files().is_empty());
}

#[test]
fn clear_recent_files_needs_a_position() {
    let o = Outline::new();
    let u = Undoer::default();
    assert!(matches!(
        u.before_clear_recent_files(&o),
        Err(UndoError::NoCurrentPosition)
    ));
}

// ============================================================================
// Marked-node commands
// ============================================================================

#[test]
fn delete_marked_round_trip() {
    let (mut o, a, b, _) = abc();
    let a1 = o.insert_as_last_child(Some(&a), "A1").unwrap();
    o.set_marked(a1.v(), true).unwrap();
    o.set_marked(b.v(), true).unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    let p = o.current().unwrap();
    let deleted = o.delete_marked().unwrap();
    assert_eq!(deleted.len(), 2);
    u.after_delete_marked_nodes(&o, &p, deleted);
    let after = o.render();
    assert_eq!(o.headlines(), ["A", "C"]);

    assert_round_trip(&mut u, &mut o, &before, &after);
}

#[test]
fn move_marked_round_trip() {
    let (mut o, a, b, _) = abc();
    o.set_marked(b.v(), true).unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    let moved = o.move_marked(&a).unwrap().unwrap();
    u.after_move_marked_nodes(&o, &a, moved);
    let after = o.render();
    assert_eq!(o.headlines(), ["A", "C", MOVED_CONTAINER, "B"]);

    assert_round_trip(&mut u, &mut o, &before, &after);
}

#[test]
fn clone_marked_round_trip() {
    let (mut o, a, _, c) = abc();
    o.set_marked(c.v(), true).unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    o.clone_marked(&a).unwrap().unwrap();
    u.after_clone_marked_nodes(&o, &a);
    let after = o.render();
    assert_eq!(o.headlines(), ["A", CLONES_CONTAINER, "C", "B", "C"]);

    assert_round_trip(&mut u, &mut o, &before, &after);
}

#[test]
fn copy_marked_round_trip() {
    let (mut o, a, b, _) = abc();
    o.set_marked(b.v(), true).unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    o.copy_marked(&a).unwrap().unwrap();
    u.after_copy_marked_nodes(&o, &a);
    let after = o.render();

    assert_round_trip(&mut u, &mut o, &before, &after);
}

#[test]
fn copy_marked_subtree_round_trip() {
    let (mut o, a, b, _) = abc();
    let b1 = o.insert_as_last_child(Some(&b), "B1").unwrap();
    o.insert_as_last_child(Some(&b1), "B1a").unwrap();
    o.insert_as_last_child(Some(&b), "B2").unwrap();
    o.set_marked(b.v(), true).unwrap();
    let mut u = Undoer::default();
    let before = o.render();

    o.copy_marked(&a).unwrap().unwrap();
    o.check_outline().unwrap();
    u.after_copy_marked_nodes(&o, &a);
    let after = o.render();
    assert_eq!(
        o.headlines(),
        ["A", COPIES_CONTAINER, "B", "B1", "B1a", "B2", "B", "B1", "B1a", "B2", "C"]
    );

    assert_round_trip(&mut u, &mut o, &before, &after);
    assert!(!u.can_redo());
    u.undo(&mut o).unwrap();
    o.check_outline().unwrap();
    assert_eq!(o.render(), before);
}

#[test]
fn undo_clone_marked_rejects_missing_container() {
    let (mut o, a, _, c) = abc();
    o.set_marked(c.v(), true).unwrap();
    let mut u = Undoer::default();

    let container = o.clone_marked(&a).unwrap().unwrap();
    u.after_clone_marked_nodes(&o, &a);
    o.delete_position(&container).unwrap();
    o.select_position(&a);

    let err = u.undo(&mut o).unwrap_err();
    assert!(matches!(err, UndoError::InternalInconsistency { .. }));
    assert!(u.can_undo());
}

// ============================================================================
// Groups
// ============================================================================

#[test]
fn group_replays_as_one_step() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();

    u.before_change_group(&o, &a, "Convert");
    let data = u.before_change_headline(&o, &a);
    o.set_head(a.v(), "A!").unwrap();
    u.after_change_headline(&o, "Change Headline", data);
    let data = u.before_change_body(&o, &a);
    o.set_body(a.v(), "converted").unwrap();
    u.after_change_body(&o, "Change Body", data);
    u.after_change_group(&o, &a, "Convert", false).unwrap();

    assert_eq!(u.beads().len(), 1);
    assert_eq!(u.undo_type(), "Convert");

    assert_eq!(u.undo(&mut o).unwrap(), replayed("Convert", 2));
    assert_eq!((o.head(a.v()), o.body(a.v())), ("A", ""));
    assert_eq!(u.redo(&mut o).unwrap(), replayed("Convert", 2));
    assert_eq!((o.head(a.v()), o.body(a.v())), ("A!", "converted"));
}

#[test]
fn replace_all_group_undoes_in_one_step() {
    let (mut o, a, b, c) = abc();
    let mut u = Undoer::default();

    u.before_change_group(&o, &a, "Replace All");
    for (p, body) in [(&a, "one"), (&b, "two"), (&c, "three")] {
        let data = u.before_change_node_contents(&o, p);
        o.set_body(p.v(), body).unwrap();
        u.after_change_node_contents(&o, "Change Node", data);
    }
    u.after_change_group(&o, &a, "Replace All", false).unwrap();

    assert_eq!(u.beads().len(), 1);
    let group = u.peek_bead(0).unwrap().group().unwrap();
    assert_eq!(group.state, GroupState::Closed);
    assert_eq!(group.items.len(), 3);

    assert_eq!(u.undo(&mut o).unwrap(), replayed("Replace All", 3));
    assert_eq!((o.body(a.v()), o.body(b.v()), o.body(c.v())), ("", "", ""));
    assert!(!u.can_undo());
    assert!(u.can_redo());

    assert_eq!(u.redo(&mut o).unwrap(), replayed("Replace All", 3));
    assert_eq!(
        (o.body(a.v()), o.body(b.v()), o.body(c.v())),
        ("one", "two", "three")
    );
}

#[test]
fn open_group_names_the_undo_menu() {
    let (o, a, _, _) = abc();
    let mut u = Undoer::default();
    let data = u.before_change_body(&o, &a);
    u.after_change_body(&o, "Change Body", data);

    u.before_change_group(&o, &a, "Reformat");
    assert_eq!(u.undo_type(), "Reformat");
    assert_eq!(u.undo_menu_label(), "Undo Reformat");
    u.after_change_group(&o, &a, "Reformat", false).unwrap();
    assert_eq!(u.undo_type(), "Reformat");
}

#[test]
fn nested_groups_close_innermost_first() {
    let (mut o, a, b, _) = abc();
    let mut u = Undoer::default();

    u.before_change_group(&o, &a, "Outer");
    let data = u.before_change_body(&o, &a);
    o.set_body(a.v(), "outer").unwrap();
    u.after_change_body(&o, "Change Body", data);

    u.before_change_group(&o, &b, "Inner");
    let data = u.before_change_body(&o, &b);
    o.set_body(b.v(), "inner").unwrap();
    u.after_change_body(&o, "Change Body", data);
    u.after_change_group(&o, &b, "Inner", false).unwrap();
    assert_eq!(u.beads().len(), 1);
    assert!(u.peek_bead(0).unwrap().is_open_group());

    u.after_change_group(&o, &a, "Outer", false).unwrap();
    assert_eq!(u.beads().len(), 1);
    assert_eq!(u.peek_bead(0).unwrap().leaf_count(), 2);

    assert_eq!(u.undo(&mut o).unwrap(), replayed("Outer", 2));
    assert_eq!((o.body(a.v()), o.body(b.v())), ("", ""));
    u.redo(&mut o).unwrap();
    assert_eq!((o.body(a.v()), o.body(b.v())), ("outer", "inner"));
}

#[test]
fn closing_without_open_group_is_an_error() {
    let (o, a, _, _) = abc();
    let mut u = Undoer::default();
    u.before_change_group(&o, &a, "Group");
    u.after_change_group(&o, &a, "Group", false).unwrap();

    let err = u.after_change_group(&o, &a, "Group", false).unwrap_err();
    assert!(matches!(err, UndoError::MismatchedGroup { .. }));
    assert_eq!(u.beads().len(), 1);
}

#[test]
fn group_after_undo_prunes_redo() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();
    let data = u.before_change_body(&o, &a);
    o.set_body(a.v(), "one").unwrap();
    u.after_change_body(&o, "Change Body", data);
    u.undo(&mut o).unwrap();
    assert!(u.can_redo());

    u.before_change_group(&o, &a, "Group");
    u.after_change_group(&o, &a, "Group", false).unwrap();
    assert!(!u.can_redo());
    assert_eq!(u.beads().len(), 1);
}

// ============================================================================
// Cap and failures
// ============================================================================

#[test]
fn history_is_capped() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::new(UndoConfig::default().with_max_stack_size(3));

    for n in 0..5 {
        let data = u.before_change_body(&o, &a);
        o.set_body(a.v(), &format!("v{n}")).unwrap();
        u.after_change_body(&o, "Change Body", data);
    }
    assert_eq!(u.beads().len(), 3);

    for _ in 0..3 {
        assert!(matches!(u.undo(&mut o).unwrap(), ReplayOutcome::Replayed { .. }));
    }
    assert_eq!(o.body(a.v()), "v1");
    assert_eq!(u.undo(&mut o).unwrap(), ReplayOutcome::Nothing);
}

#[test]
fn capped_history_never_resurrects_dropped_beads() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::new(UndoConfig::default().with_max_stack_size(5));

    for n in 0..8 {
        let data = u.before_change_body(&o, &a);
        o.set_body(a.v(), &format!("v{n}")).unwrap();
        u.after_change_body(&o, &format!("Edit {n}"), data);
        assert!(u.beads().len() <= 5);
    }
    assert_eq!(u.beads().len(), 5);
    assert_eq!(u.peek_bead(0).unwrap().undo_type, "Edit 3");

    let mut undone = 0;
    while u.undo(&mut o).unwrap() != ReplayOutcome::Nothing {
        undone += 1;
    }
    assert_eq!(undone, 5);
    assert_eq!(o.body(a.v()), "v2");

    let mut redone = Vec::new();
    while let ReplayOutcome::Replayed { undo_type, .. } = u.redo(&mut o).unwrap() {
        redone.push(undo_type);
    }
    assert_eq!(redone, ["Edit 3", "Edit 4", "Edit 5", "Edit 6", "Edit 7"]);
    assert_eq!(o.body(a.v()), "v7");
}

#[test]
fn lowering_the_cap_trims_redo_tail() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();
    for n in 0..6 {
        let data = u.before_change_body(&o, &a);
        o.set_body(a.v(), &format!("v{n}")).unwrap();
        u.after_change_body(&o, "Change Body", data);
    }
    for _ in 0..4 {
        u.undo(&mut o).unwrap();
    }
    assert_eq!(o.body(a.v()), "v1");

    u.reload_settings(UndoConfig::default().with_max_stack_size(3));
    assert_eq!(u.beads().len(), 3);
    assert_eq!(u.cursor(), Some(1));

    u.redo(&mut o).unwrap();
    assert_eq!(o.body(a.v()), "v2");
    assert!(!u.can_redo());
    for _ in 0..3 {
        u.undo(&mut o).unwrap();
    }
    assert_eq!(o.body(a.v()), "");
    assert!(!u.can_undo());
}

#[test]
fn failed_undo_keeps_cursor() {
    let (mut o, a, _, c) = abc();
    let mut u = Undoer::default();

    let data = u.before_move_node(&o, &c);
    let moved = o.move_to_nth_child(&c, Some(&a), 0).unwrap();
    u.after_move_node(&o, &moved, "Move Node", data);

    // Move it back behind the undoer's back.
    o.move_to_nth_child(&moved, None, 2).unwrap();
    let err = u.undo(&mut o).unwrap_err();
    assert!(matches!(err, UndoError::InternalInconsistency { .. }));
    assert_eq!(u.cursor(), Some(0));
    assert_eq!(u.undo_type(), "Move Node");
    assert_eq!(u.state(), ReplayState::Idle);
}

#[test]
fn clear_undo_state_forgets_everything() {
    let (mut o, a, _, _) = abc();
    let mut u = Undoer::default();
    let data = u.before_change_body(&o, &a);
    o.set_body(a.v(), "x").unwrap();
    u.after_change_body(&o, "Change Body", data);
    u.clear_undo_state();
    assert!(u.beads().is_empty());
    assert_eq!(u.enable_menu_items(), (false, false));
    assert_eq!(u.undo(&mut o).unwrap(), ReplayOutcome::Nothing);
}
