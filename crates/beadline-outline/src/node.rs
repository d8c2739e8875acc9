#![forbid(unsafe_code)]

//! Vnodes: the shared data behind every outline position.
//!
//! A vnode owns a headline, a body, status bits, and two link lists. A node
//! that appears in several places in the outline (a clone) is one vnode with
//! several entries in its `parents` list.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Identifier of a vnode inside an [`Outline`](crate::Outline) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a node id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Per-vnode status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusBits: u16 {
        /// Contents differ from what was last written to the node's file.
        const DIRTY = 1 << 0;
        /// User mark.
        const MARKED = 1 << 1;
        /// Children are shown.
        const EXPANDED = 1 << 2;
    }
}

/// Attributes read from a file that the outline does not interpret.
pub type UnknownAttributes = BTreeMap<String, String>;

/// Headline directives that bind a subtree to an external file.
const AT_FILE_DIRECTIVES: &[&str] = &[
    "@asis", "@auto", "@clean", "@edit", "@file", "@nosent", "@shadow", "@thin",
];

/// Returns true if `head` names an external file (`@file x.py`, `@clean y`, ...).
#[must_use]
pub fn is_at_file_headline(head: &str) -> bool {
    if !head.starts_with('@') {
        return false;
    }
    let word = head.split_whitespace().next().unwrap_or_default();
    AT_FILE_DIRECTIVES.contains(&word) || word.starts_with("@auto-")
}

/// One shared node of the outline graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vnode {
    pub(crate) head: String,
    pub(crate) body: String,
    pub(crate) status: StatusBits,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) unknown_attributes: Option<UnknownAttributes>,
}

impl Vnode {
    #[must_use]
    pub fn new(head: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn head(&self) -> &str {
        &self.head
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn status(&self) -> StatusBits {
        self.status
    }

    #[must_use]
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Number of places this vnode appears in the outline.
    #[must_use]
    pub fn clone_count(&self) -> usize {
        self.parents.len()
    }
}
