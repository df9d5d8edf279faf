//! Goal tree loading with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::core::invariants::validate_invariants;
use crate::tree::{GoalTree, RawNode};

/// JSON Schema for the nested goal tree format.
pub const TREE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/goal_tree.v1.schema.json"
));

/// Load and validate a goal tree from a JSON file.
pub fn load_tree(tree_path: &Path) -> Result<GoalTree> {
    let contents = fs::read_to_string(tree_path)
        .with_context(|| format!("read tree {}", tree_path.display()))?;
    parse_tree(&contents).with_context(|| format!("load tree {}", tree_path.display()))
}

/// Parse and validate a goal tree from JSON text.
pub fn parse_tree(contents: &str) -> Result<GoalTree> {
    let value: Value = serde_json::from_str(contents).context("parse tree json")?;
    validate_schema(&value)?;
    let raw: RawNode = serde_json::from_value(value).context("deserialize tree")?;
    let errors = validate_invariants(&raw);
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(anyhow!("tree invariants failed: {}", messages.join("; ")));
    }
    let tree = GoalTree::from_raw(&raw)?;
    debug!(nodes = tree.len(), root = tree.name(tree.root()), "tree loaded");
    Ok(tree)
}

/// Serialize a tree (with violation flags) as pretty JSON with trailing newline.
pub fn tree_to_json(tree: &GoalTree) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(&tree.to_raw()).context("serialize tree")?;
    buf.push('\n');
    Ok(buf)
}

fn validate_schema(tree: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(TREE_SCHEMA).context("parse tree schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(tree) {
        let messages = compiled
            .iter_errors(tree)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "tree schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{coffee_tree, load_tree_fixture};

    #[test]
    fn fixture_matches_builder_tree() {
        let loaded = load_tree_fixture("coffee").expect("fixture");
        assert_eq!(loaded, coffee_tree());
    }

    #[test]
    fn schema_rejects_missing_type() {
        let err = parse_tree(r#"{"name": "root"}"#).expect_err("missing type");
        assert!(format!("{err:#}").contains("schema validation failed"));
    }

    #[test]
    fn schema_rejects_short_costs() {
        let err = parse_tree(r#"{"name": "root", "type": "ACT", "costs": [1, 2]}"#)
            .expect_err("short costs");
        assert!(format!("{err:#}").contains("schema validation failed"));
    }

    #[test]
    fn invariants_report_duplicates() {
        let json = r#"{
            "name": "root",
            "type": "OR",
            "children": [
                {"name": "a", "type": "ACT"},
                {"name": "a", "type": "ACT"}
            ]
        }"#;
        let err = parse_tree(json).expect_err("duplicate");
        assert!(format!("{err:#}").contains("duplicate node name 'a'"));
    }

    #[test]
    fn unknown_type_label_survives_round_trip() {
        let tree = parse_tree(
            r#"{"name": "r", "type": "OR", "children": [{"name": "x", "type": "XOR"}]}"#,
        )
        .expect("parse");
        let json = tree_to_json(&tree).expect("json");
        assert!(json.contains(r#""type": "XOR""#), "{json}");
        assert!(!json.contains("UNKNOWN"));

        let reloaded = parse_tree(&json).expect("reload");
        assert_eq!(reloaded, tree);
    }

    #[test]
    fn written_json_loads_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tree.json");
        let tree = coffee_tree();
        fs::write(&path, tree_to_json(&tree).expect("json")).expect("write");

        let loaded = load_tree(&path).expect("load");
        assert_eq!(loaded, tree);
    }
}
