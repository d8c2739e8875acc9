#![forbid(unsafe_code)]

//! The bead list and its cursor.
//!
//! # Layout
//!
//! ```text
//! beads:  [ b0 ][ b1 ][ b2 ][ b3 ][ b4 ]
//!                       ^cursor
//!         <-- undoable ---->|<-- redoable -->
//! ```
//!
//! # Invariants
//!
//! - `cursor` is `None` or a valid index into `beads`.
//! - Beads after the cursor are redoable; pushing a top-level bead drops them.
//! - While a group is open, pushes append to its items instead.
//! - Outside an open group, `beads.len() <= max_size` after every trim.
//! - Trimming to `max_size` never removes beads while a group is open.

use crate::bead::{Bead, BeadKind, innermost_open_group};

/// Where a pushed bead ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
    /// Appended to the history, dropping any redo tail.
    TopLevel,
    /// Appended to the open group on top of the history.
    IntoGroup,
}

#[derive(Debug, Clone, Default)]
pub struct BeadStack {
    beads: Vec<Bead>,
    /// Number of undoable beads; the cursor is `applied - 1`.
    applied: usize,
    max_size: usize,
}

impl BeadStack {
    /// Create an empty stack. `max_size == 0` means unbounded.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            beads: Vec::new(),
            applied: 0,
            max_size,
        }
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Index of the most recently applied bead.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.beads.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beads.is_empty()
    }

    #[must_use]
    pub fn beads(&self) -> &[Bead] {
        &self.beads
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// The bead at index `n`, if any.
    #[must_use]
    pub fn peek(&self, n: usize) -> Option<&Bead> {
        self.beads.get(n)
    }

    pub(crate) fn peek_mut(&mut self, n: usize) -> Option<&mut Bead> {
        self.beads.get_mut(n)
    }

    /// The bead the next undo replays.
    #[must_use]
    pub fn top(&self) -> Option<&Bead> {
        self.cursor().and_then(|n| self.beads.get(n))
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Bead> {
        let n = self.cursor()?;
        self.beads.get_mut(n)
    }

    /// The bead the next redo replays.
    #[must_use]
    pub fn next_redo(&self) -> Option<&Bead> {
        self.beads.get(self.applied)
    }

    /// True if any bead in the history is an open group.
    #[must_use]
    pub fn has_open_group(&self) -> bool {
        self.beads.iter().rev().any(Bead::is_open_group)
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Push a bead, honouring any open group.
    pub fn push(&mut self, bead: Bead) -> Pushed {
        if let Some(group) = self.top_mut().and_then(innermost_open_group)
            && let BeadKind::Group(g) = &mut group.kind
        {
            g.items.push(bead);
            return Pushed::IntoGroup;
        }
        self.beads.truncate(self.applied);
        self.beads.push(bead);
        self.applied = self.beads.len();
        Pushed::TopLevel
    }

    /// Drop every bead after the cursor.
    pub fn truncate_redo(&mut self) {
        self.beads.truncate(self.applied);
    }

    /// Move the cursor back one bead after a successful undo.
    pub(crate) fn retreat(&mut self) {
        self.applied = self.applied.saturating_sub(1);
    }

    /// Move the cursor forward one bead after a successful redo.
    pub(crate) fn advance(&mut self) {
        self.applied = (self.applied + 1).min(self.beads.len());
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Drop beads until at most `max_size` remain.
    ///
    /// The oldest undoable beads go first, then redoable beads from the far
    /// end. Returns the number of beads dropped.
    pub fn cut(&mut self) -> usize {
        if self.max_size == 0 || self.beads.len() <= self.max_size || self.has_open_group() {
            return 0;
        }
        let excess = self.applied.saturating_sub(self.max_size);
        self.beads.drain(..excess);
        self.applied -= excess;
        let tail = self.beads.len().saturating_sub(self.max_size);
        self.beads.truncate(self.max_size);
        excess + tail
    }

    pub fn clear(&mut self) {
        self.beads.clear();
        self.applied = 0;
    }
}

// ============================================================================
// Tests
// ============================================================================
