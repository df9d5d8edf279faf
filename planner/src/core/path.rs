//! Helpers for rendering deterministic node paths.

use crate::tree::{GoalTree, NodeId};

/// Return the `/`-separated name path from the root to `id`.
pub fn node_path(tree: &GoalTree, id: NodeId) -> String {
    let mut names: Vec<&str> = tree.ancestors(id).map(|ancestor| tree.name(ancestor)).collect();
    names.reverse();
    names.push(tree.name(id));
    names.join("/")
}

/// Return the name path to the node called `name`, if present.
pub fn path_of(tree: &GoalTree, name: &str) -> Option<String> {
    tree.find(name).map(|id| node_path(tree, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::coffee_tree;

    #[test]
    fn node_path_returns_root_for_root_id() {
        let tree = coffee_tree();
        assert_eq!(node_path(&tree, tree.root()), "getCoffee");
    }

    #[test]
    fn path_of_nested_action() {
        let tree = coffee_tree();
        assert_eq!(
            path_of(&tree, "getOthersCard"),
            Some("getCoffee/getKitchenCoffee/getStaffCard/getOthersCard".to_string())
        );
        assert_eq!(path_of(&tree, "missing"), None);
    }
}
