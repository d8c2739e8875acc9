#![forbid(unsafe_code)]

//! Positions: a path from the hidden root to one occurrence of a vnode.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// A location in the outline.
///
/// `stack` holds `(ancestor, child_index)` pairs from the top level down to
/// the direct parent. An empty stack means a top-level node whose parent is
/// the hidden root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    v: NodeId,
    child_index: usize,
    stack: Vec<(NodeId, usize)>,
}

impl Position {
    #[must_use]
    pub fn new(v: NodeId, child_index: usize, stack: Vec<(NodeId, usize)>) -> Self {
        Self {
            v,
            child_index,
            stack,
        }
    }

    /// A top-level position.
    #[must_use]
    pub fn top_level(v: NodeId, child_index: usize) -> Self {
        Self::new(v, child_index, Vec::new())
    }

    #[must_use]
    pub const fn v(&self) -> NodeId {
        self.v
    }

    #[must_use]
    pub const fn child_index(&self) -> usize {
        self.child_index
    }

    #[must_use]
    pub fn stack(&self) -> &[(NodeId, usize)] {
        &self.stack
    }

    /// Depth below the top level.
    #[must_use]
    pub fn level(&self) -> usize {
        self.stack.len()
    }

    /// The vnode of the direct parent, or `None` at the top level.
    #[must_use]
    pub fn parent_v(&self) -> Option<NodeId> {
        self.stack.last().map(|&(v, _)| v)
    }

    /// Position of the direct parent.
    #[must_use]
    pub fn parent_position(&self) -> Option<Self> {
        let (&(v, child_index), rest) = self.stack.split_last()?;
        Some(Self::new(v, child_index, rest.to_vec()))
    }

    /// Position of `child`, assumed to be the `n`th child of this position.
    #[must_use]
    pub fn child(&self, child: NodeId, n: usize) -> Self {
        let mut stack = self.stack.clone();
        stack.push((self.v, self.child_index));
        Self::new(child, n, stack)
    }

    /// Position of `sibling`, assumed to be the `n`th child of the same parent.
    #[must_use]
    pub fn sibling(&self, sibling: NodeId, n: usize) -> Self {
        Self::new(sibling, n, self.stack.clone())
    }

    /// True if `other` lies inside the subtree rooted here (or is this position).
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        let depth = self.stack.len();
        if other.stack.len() < depth {
            return false;
        }
        if other.stack.len() == depth {
            return other == self;
        }
        other.stack[..depth] == self.stack[..] && other.stack[depth] == (self.v, self.child_index)
    }
}
