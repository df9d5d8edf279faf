//! Structural invariants for nested goal tree records.

use std::collections::HashSet;

use crate::tree::{RawNode, TreeError};

/// Check structural invariants a JSON Schema cannot express:
/// - Every node has a non-empty name
/// - Names are unique across the whole tree
/// - Costs, when present, have exactly three finite non-negative entries
///
/// Errors are reported in pre-order.
pub fn validate_invariants(root: &RawNode) -> Vec<TreeError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    validate_node(root, &mut seen, &mut errors, &display_name(root, 0));
    errors
}

fn validate_node<'a>(
    node: &'a RawNode,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<TreeError>,
    path: &str,
) {
    if node.name.trim().is_empty() {
        errors.push(TreeError::MissingName {
            path: path.to_string(),
        });
    } else if !seen.insert(node.name.as_str()) {
        errors.push(TreeError::DuplicateName {
            name: node.name.clone(),
            path: path.to_string(),
        });
    }

    if let Some(costs) = &node.costs {
        if costs.len() != 3 {
            errors.push(TreeError::CostArity {
                name: node.name.clone(),
                found: costs.len(),
            });
        } else if let Some(value) = costs.iter().find(|v| !v.is_finite() || **v < 0.0) {
            errors.push(TreeError::InvalidCost {
                name: node.name.clone(),
                value: *value,
            });
        }
    }

    for (position, child) in node.children.iter().enumerate() {
        let child_path = format!("{}/{}", path, display_name(child, position));
        validate_node(child, seen, errors, &child_path);
    }
}

/// Name for error paths; nameless nodes are shown by sibling position.
fn display_name(node: &RawNode, position: usize) -> String {
    if node.name.trim().is_empty() {
        format!("#{position}")
    } else {
        node.name.clone()
    }
}
