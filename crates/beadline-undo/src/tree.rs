#![forbid(unsafe_code)]

//! Whole-subtree snapshots for tree beads.

use beadline_outline::{Document, NodeId, OutlineError, Position, StatusBits, UnknownAttributes};
use serde::Serialize;

/// Link structure of one vnode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureSnapshot {
    pub status: StatusBits,
    pub parents: Vec<NodeId>,
    pub children: Vec<NodeId>,
    pub unknown_attributes: Option<UnknownAttributes>,
}

/// Text of one vnode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentSnapshot {
    pub status: StatusBits,
    pub head: String,
    pub body: String,
    pub unknown_attributes: Option<UnknownAttributes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub v: NodeId,
    pub structure: StructureSnapshot,
    pub content: ContentSnapshot,
}

/// Snapshot of a subtree in outline order, rooted at the snapshot's first node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<NodeSnapshot>,
}

impl TreeSnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Capture `p` and every node below it.
///
/// A vnode reached through several clones appears once per occurrence.
pub fn save_tree<D: Document + ?Sized>(doc: &D, p: &Position) -> TreeSnapshot {
    let mut nodes = Vec::new();
    let mut pending = vec![p.v()];
    while let Some(v) = pending.pop() {
        let attributes = doc.unknown_attributes(v).cloned();
        nodes.push(NodeSnapshot {
            v,
            structure: StructureSnapshot {
                status: doc.status(v),
                parents: doc.parents(v).to_vec(),
                children: doc.children(v).to_vec(),
                unknown_attributes: attributes.clone(),
            },
            content: ContentSnapshot {
                status: doc.status(v),
                head: doc.head(v).to_string(),
                body: doc.body(v).to_string(),
                unknown_attributes: attributes,
            },
        });
        pending.extend(doc.children(v).iter().rev());
    }
    TreeSnapshot { nodes }
}

/// Write every snapshotted node back into `doc`.
pub fn restore_tree<D: Document + ?Sized>(
    doc: &mut D,
    snapshot: &TreeSnapshot,
) -> Result<(), OutlineError> {
    for node in &snapshot.nodes {
        let v = node.v;
        doc.set_parents(v, node.structure.parents.clone())?;
        doc.set_children(v, node.structure.children.clone())?;
        doc.set_head(v, &node.content.head)?;
        doc.set_body(v, &node.content.body)?;
        doc.set_status(v, node.content.status)?;
        doc.set_unknown_attributes(v, node.content.unknown_attributes.clone())?;
    }
    tracing::trace!(target: "beadline.undo", nodes = snapshot.len(), "restored tree");
    Ok(())
}
