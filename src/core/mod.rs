//! Outline tree data model and document-order flattening.
//!
//! This module provides the types shared by every direction of the bridge:
//!
//! - [`NodeId`] - Opaque, host-assigned node identity
//! - [`ViewType`] - How a node's children are displayed
//! - [`OutlineNode`] and [`OutlineTree`] - Snapshot of a host outline
//! - [`FlatEntry`] - Pre-order projection of a tree with levels
//! - [`Annotation`] and [`Document`] - Flat annotated text (see [`mark`])

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod mark;

pub use mark::{Annotation, AnnotationType, Attributes, Document, Violation};

/// Level assigned to the direct children of a tree root.
pub const ROOT_CHILD_LEVEL: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Bullet,
    Numbered,
    Document,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewType::Bullet => "bullet",
            ViewType::Numbered => "numbered",
            ViewType::Document => "document",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineNode {
    pub id: NodeId,
    /// Raw markup text of this node only.
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
    /// View type set on this node; descendants inherit it unless they override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<ViewType>,
}

impl OutlineNode {
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            children: Vec::new(),
            view_type: None,
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_view_type(mut self, view_type: ViewType) -> Self {
        self.view_type = Some(view_type);
        self
    }

    /// Number of nodes in this subtree, including the node itself.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(OutlineNode::subtree_len)
            .sum::<usize>()
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A host outline as seen at one point in time: the page root plus its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineTree {
    pub root: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<ViewType>,
    #[serde(default)]
    pub children: Vec<OutlineNode>,
}

impl OutlineTree {
    pub fn new(root: impl Into<NodeId>) -> Self {
        Self {
            root: root.into(),
            view_type: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineNode>) -> Self {
        self.children = children;
        self
    }

    pub fn flatten(&self) -> Vec<FlatEntry> {
        flatten(&self.children)
    }

    pub fn len(&self) -> usize {
        self.children.iter().map(OutlineNode::subtree_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
    pub id: NodeId,
    pub text: String,
    pub level: usize,
}

/// Flattens root children into document order, starting at level 1.
pub fn flatten(nodes: &[OutlineNode]) -> Vec<FlatEntry> {
    flatten_from(nodes, ROOT_CHILD_LEVEL)
}

/// Flattens `nodes` in pre-order, assigning `level` to the first tier.
pub fn flatten_from(nodes: &[OutlineNode], level: usize) -> Vec<FlatEntry> {
    let mut entries = Vec::new();
    collect_entries(nodes, level, &mut entries);
    entries
}

fn collect_entries(nodes: &[OutlineNode], level: usize, out: &mut Vec<FlatEntry>) {
    for node in nodes {
        out.push(FlatEntry {
            id: node.id.clone(),
            text: node.text.clone(),
            level,
        });
        collect_entries(&node.children, level + 1, out);
    }
}
