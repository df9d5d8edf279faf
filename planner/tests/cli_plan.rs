//! CLI tests for `planner` commands.
//!
//! Spawns the planner binary against temp tree/query files and verifies exit
//! codes and stdout for planned, no-plan and invalid inputs.

use std::process::{Command, Output};

use planner::exit_codes;
use planner::test_support::TestWorkspace;

const COFFEE_QUERY: &str = r#"
beliefs = ["ownCard", "haveMoney"]
goal = "haveCoffee"
action = "getCoffeeShop"

[norm]
type = "P"
actions = ["gotoKitchen"]

[preference]
label = "price"
order = [1, 2, 0]

[options]
seed = 11
"#;

fn planner(workspace: &TestWorkspace, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_planner"))
        .current_dir(workspace.path())
        .args(args)
        .output()
        .expect("run planner")
}

#[test]
fn plan_json_selects_shop_and_exits_ok() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace.write_coffee_tree().expect("tree");
    workspace.write("query.toml", COFFEE_QUERY).expect("query");

    let output = planner(
        &workspace,
        &["plan", "--tree", "tree.json", "--query", "query.toml", "--json"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(
        report["selected"]["trace"],
        serde_json::json!(["getCoffee", "getShopCoffee", "gotoShop", "payShop", "getCoffeeShop"])
    );
    assert_eq!(report["explanation"][0][0], "C");
}

#[test]
fn plan_without_feasible_trace_exits_no_plan() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace.write_coffee_tree().expect("tree");
    workspace
        .write("query.toml", "beliefs = []\ngoal = \"haveCoffee\"\n")
        .expect("query");

    let output = planner(&workspace, &["plan", "--tree", "tree.json", "--query", "query.toml"]);
    assert_eq!(output.status.code(), Some(exit_codes::NO_PLAN));
    assert!(String::from_utf8_lossy(&output.stdout).contains("no feasible plan"));
}

#[test]
fn annotate_draws_violations() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace.write_coffee_tree().expect("tree");
    workspace.write("query.toml", COFFEE_QUERY).expect("query");

    let output = planner(
        &workspace,
        &["annotate", "--tree", "tree.json", "--query", "query.toml"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("getKitchenCoffee [SEQ] violation=true"));
    assert!(stdout.contains("getShopCoffee [SEQ] violation=false"));
}

#[test]
fn traces_lists_structural_runs() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace.write_coffee_tree().expect("tree");

    let output = planner(&workspace, &["traces", "--tree", "tree.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let runs: Vec<Vec<String>> = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(runs.len(), 4);
}

#[test]
fn malformed_tree_exits_invalid() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write(
            "tree.json",
            r#"{"name": "root", "type": "OR", "children": [{"name": "root", "type": "ACT"}]}"#,
        )
        .expect("tree");
    workspace.write("query.toml", COFFEE_QUERY).expect("query");

    let output = planner(&workspace, &["plan", "--tree", "tree.json", "--query", "query.toml"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate node name"));
}
