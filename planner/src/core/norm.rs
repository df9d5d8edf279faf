//! Norms and bottom-up violation annotation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::{GoalTree, NodeKind};

/// Deontic type of a norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormType {
    /// Listed actions are forbidden.
    #[serde(rename = "P")]
    Prohibition,
    /// Only listed actions are allowed.
    #[serde(rename = "O")]
    Obligation,
    /// Any other type: nothing is restricted.
    #[default]
    #[serde(rename = "none", other)]
    Unrestricted,
}

impl NormType {
    pub fn as_str(self) -> &'static str {
        match self {
            NormType::Prohibition => "P",
            NormType::Obligation => "O",
            NormType::Unrestricted => "none",
        }
    }
}

/// A single active norm.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Norm {
    #[serde(rename = "type", default)]
    pub kind: NormType,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Norm {
    pub fn prohibition<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: NormType::Prohibition,
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn obligation<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: NormType::Obligation,
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether executing the named action breaches this norm.
    pub fn forbids(&self, action: &str) -> bool {
        let listed = self.actions.iter().any(|a| a == action);
        match self.kind {
            NormType::Prohibition => listed,
            NormType::Obligation => !listed,
            NormType::Unrestricted => false,
        }
    }
}

/// Renders as `P(a, b)`.
impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.as_str(), self.actions.join(", "))
    }
}

/// Mark every node of `tree` as violating `norm` or not.
///
/// Actions are tested against the norm directly. `SEQ`/`AND` nodes violate if
/// any child does; `OR` nodes only if every child does. Childless composites
/// and unknown node types never violate. Re-annotating with the same norm is
/// a no-op.
pub fn annotate(tree: &mut GoalTree, norm: &Norm) {
    // Reverse pre-order visits every child before its parent.
    let order: Vec<_> = tree.ids().rev().collect();
    for id in order {
        let node = tree.node(id);
        let children = node.children();
        let violation = match node.kind {
            NodeKind::Act => norm.forbids(&node.name),
            NodeKind::Seq | NodeKind::And => {
                children.iter().any(|child| tree.node(*child).violation)
            }
            NodeKind::Or => {
                !children.is_empty() && children.iter().all(|child| tree.node(*child).violation)
            }
            NodeKind::Unknown(_) => false,
        };
        tree.node_mut(id).violation = violation;
    }
}

/// Violation flag per node name.
pub fn violations(tree: &GoalTree) -> BTreeMap<String, bool> {
    tree.ids()
        .map(|id| {
            let node = tree.node(id);
            (node.name.clone(), node.violation)
        })
        .collect()
}
