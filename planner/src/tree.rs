//! Goal tree model.
//!
//! Trees arrive as nested [`RawNode`] records (attribute bag + children) and are
//! materialized into a [`GoalTree`]: a pre-order arena with parent links and a
//! name index built once at construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::cost::CostVector;
use crate::core::invariants::validate_invariants;

/// Composition type of a node, read from the `type` label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Leaf action carrying preconditions, effects and costs.
    Act,
    /// Ordered composition; every child is required.
    Seq,
    /// Conjunctive composition; executed in sequence order like `Seq`.
    And,
    /// Alternatives; one child per execution.
    Or,
    /// Any label not listed above, kept verbatim for output. Contributes no
    /// traces and no violation.
    Unknown(String),
}

impl NodeKind {
    pub fn is_composite(&self) -> bool {
        matches!(self, NodeKind::Seq | NodeKind::And | NodeKind::Or)
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Act => "ACT",
            NodeKind::Seq => "SEQ",
            NodeKind::And => "AND",
            NodeKind::Or => "OR",
            NodeKind::Unknown(label) => label,
        }
    }
}

impl From<String> for NodeKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "ACT" => NodeKind::Act,
            "SEQ" => NodeKind::Seq,
            "AND" => NodeKind::And,
            "OR" => NodeKind::Or,
            _ => NodeKind::Unknown(label),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Unknown(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// Nested input record for a goal tree node.
///
/// `violation` is output-only: it is ignored when building a [`GoalTree`] and
/// filled in by [`GoalTree::to_raw`] after annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costs: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slink: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawNode>,
}

/// Structural errors detected while building a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("node at {path} has no name")]
    MissingName { path: String },
    #[error("duplicate node name '{name}' at {path}")]
    DuplicateName { name: String, path: String },
    #[error("node '{name}' has {found} cost entries, expected 3")]
    CostArity { name: String, found: usize },
    #[error("node '{name}' has invalid cost {value} (costs must be finite and >= 0)")]
    InvalidCost { name: String, value: f64 },
}

/// Index of a node within its [`GoalTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// A materialized tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
    pub sequence: Option<i64>,
    pub pre: Vec<String>,
    pub post: Vec<String>,
    pub costs: Option<CostVector>,
    pub link: Vec<String>,
    pub slink: Vec<String>,
    /// Set by norm annotation; `false` until then.
    pub violation: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_action(&self) -> bool {
        self.kind == NodeKind::Act
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Rooted, ordered goal tree stored in pre-order.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalTree {
    nodes: Vec<TreeNode>,
    index: HashMap<String, NodeId>,
}

impl GoalTree {
    /// Build a tree from its nested record form.
    ///
    /// Fails with the first structural error in pre-order. Use
    /// [`validate_invariants`] to collect every error at once.
    pub fn from_raw(raw: &RawNode) -> Result<Self, TreeError> {
        if let Some(err) = validate_invariants(raw).into_iter().next() {
            return Err(err);
        }
        let mut tree = GoalTree {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        tree.insert(raw, None);
        Ok(tree)
    }

    fn insert(&mut self, raw: &RawNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            name: raw.name.clone(),
            kind: raw.kind.clone(),
            sequence: raw.sequence,
            pre: raw.pre.clone(),
            post: raw.post.clone(),
            costs: raw
                .costs
                .as_deref()
                .map(|c| CostVector::new([c[0], c[1], c[2]])),
            link: raw.link.clone(),
            slink: raw.slink.clone(),
            violation: false,
            parent,
            children: Vec::with_capacity(raw.children.len()),
        });
        self.index.insert(raw.name.clone(), id);
        for child in &raw.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    /// Look up a node id by name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Look up a node by name.
    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.find(name).map(|id| self.node(id))
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Children in execution order.
    ///
    /// Siblings with a `sequence` come first in ascending order; siblings
    /// without one follow in declaration order. The sort is stable, so equal
    /// numbers keep declaration order too.
    pub fn ordered_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.children(id).to_vec();
        children.sort_by_key(|child| match self.node(*child).sequence {
            Some(sequence) => (false, sequence),
            None => (true, 0),
        });
        children
    }

    /// Ancestors of `id`, nearest first (excluding `id` itself).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// All node ids in pre-order. Every parent precedes its children.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Convert back to the nested record form, including violation flags.
    pub fn to_raw(&self) -> RawNode {
        self.to_raw_from(self.root())
    }

    fn to_raw_from(&self, id: NodeId) -> RawNode {
        let node = self.node(id);
        RawNode {
            name: node.name.clone(),
            kind: node.kind.clone(),
            sequence: node.sequence,
            pre: node.pre.clone(),
            post: node.post.clone(),
            costs: node.costs.map(|c| c.values().to_vec()),
            link: node.link.clone(),
            slink: node.slink.clone(),
            violation: Some(node.violation),
            children: node
                .children
                .iter()
                .map(|child| self.to_raw_from(*child))
                .collect(),
        }
    }
}
