//! Test-only helpers for constructing goal trees and query files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::io::tree_store::load_tree;
use crate::tree::{GoalTree, NodeKind, RawNode};

/// Create an action node with no sequence number and no links.
pub fn act(name: &str, pre: &[&str], post: &[&str], costs: [f64; 3]) -> RawNode {
    RawNode {
        name: name.to_string(),
        kind: NodeKind::Act,
        sequence: None,
        pre: pre.iter().map(|p| p.to_string()).collect(),
        post: post.iter().map(|p| p.to_string()).collect(),
        costs: Some(costs.to_vec()),
        link: Vec::new(),
        slink: Vec::new(),
        violation: None,
        children: Vec::new(),
    }
}

/// Create a composite node with the given children.
pub fn composite(kind: NodeKind, name: &str, children: Vec<RawNode>) -> RawNode {
    RawNode {
        name: name.to_string(),
        kind,
        sequence: None,
        pre: Vec::new(),
        post: Vec::new(),
        costs: None,
        link: Vec::new(),
        slink: Vec::new(),
        violation: None,
        children,
    }
}

fn sequenced(mut node: RawNode, sequence: i64) -> RawNode {
    node.sequence = Some(sequence);
    node
}

fn linked(mut node: RawNode, link: &[&str]) -> RawNode {
    node.link = link.iter().map(|l| l.to_string()).collect();
    node
}

fn soft_linked(mut node: RawNode, slink: &[&str]) -> RawNode {
    node.slink = slink.iter().map(|l| l.to_string()).collect();
    node
}

fn with_pre(mut node: RawNode, pre: &[&str]) -> RawNode {
    node.pre = pre.iter().map(|p| p.to_string()).collect();
    node
}

/// The canonical coffee goal tree.
///
/// ```text
/// getCoffee (OR)
/// ├── getKitchenCoffee (SEQ)
/// │   ├── getStaffCard (OR): getOwnCard | getOthersCard
/// │   ├── gotoKitchen
/// │   └── getCoffeeKitchen
/// ├── getAnnOfficeCoffee (SEQ): gotoAnnOffice, getPod, getCoffeeAnnOffice
/// └── getShopCoffee (SEQ): gotoShop, payShop, getCoffeeShop
/// ```
pub fn coffee_raw() -> RawNode {
    let kitchen = with_pre(
        composite(
            NodeKind::Seq,
            "getKitchenCoffee",
            vec![
                sequenced(
                    composite(
                        NodeKind::Or,
                        "getStaffCard",
                        vec![
                            linked(
                                act("getOwnCard", &["ownCard"], &["haveCard"], [0.0, 0.0, 0.0]),
                                &["getCoffeeKitchen"],
                            ),
                            linked(
                                act(
                                    "getOthersCard",
                                    &["colleagueAvailable"],
                                    &["haveCard"],
                                    [0.0, 0.0, 2.0],
                                ),
                                &["getCoffeeKitchen"],
                            ),
                        ],
                    ),
                    1,
                ),
                sequenced(
                    linked(
                        act("gotoKitchen", &[], &["atKitchen"], [0.0, 0.0, 2.0]),
                        &["getCoffeeKitchen"],
                    ),
                    2,
                ),
                sequenced(
                    soft_linked(
                        act(
                            "getCoffeeKitchen",
                            &["haveCard", "atKitchen"],
                            &["haveCoffee"],
                            [5.0, 0.0, 1.0],
                        ),
                        &["getOwnCard", "getOthersCard", "gotoKitchen"],
                    ),
                    3,
                ),
            ],
        ),
        &["staffCardAvailable"],
    );

    let office = with_pre(
        composite(
            NodeKind::Seq,
            "getAnnOfficeCoffee",
            vec![
                sequenced(
                    linked(
                        act(
                            "gotoAnnOffice",
                            &["AnnInOffice"],
                            &["atAnnOffice"],
                            [0.0, 0.0, 2.0],
                        ),
                        &["getCoffeeAnnOffice"],
                    ),
                    1,
                ),
                sequenced(
                    linked(
                        act("getPod", &[], &["havePod"], [0.0, 0.0, 1.0]),
                        &["getCoffeeAnnOffice"],
                    ),
                    2,
                ),
                sequenced(
                    soft_linked(
                        act(
                            "getCoffeeAnnOffice",
                            &["havePod", "atAnnOffice"],
                            &["haveCoffee"],
                            [2.0, 0.0, 3.0],
                        ),
                        &["gotoAnnOffice", "getPod"],
                    ),
                    3,
                ),
            ],
        ),
        &["AnnInOffice"],
    );

    let shop = with_pre(
        composite(
            NodeKind::Seq,
            "getShopCoffee",
            vec![
                sequenced(
                    linked(
                        act("gotoShop", &[], &["atShop"], [0.0, 0.0, 5.0]),
                        &["getCoffeeShop"],
                    ),
                    1,
                ),
                sequenced(
                    linked(
                        act("payShop", &["haveMoney"], &["paidShop"], [0.0, 3.0, 1.0]),
                        &["getCoffeeShop"],
                    ),
                    2,
                ),
                sequenced(
                    soft_linked(
                        act(
                            "getCoffeeShop",
                            &["atShop", "paidShop"],
                            &["haveCoffee"],
                            [0.0, 0.0, 3.0],
                        ),
                        &["gotoShop", "payShop"],
                    ),
                    3,
                ),
            ],
        ),
        &["haveMoney"],
    );

    composite(NodeKind::Or, "getCoffee", vec![kitchen, office, shop])
}

/// The coffee tree, unannotated.
pub fn coffee_tree() -> GoalTree {
    GoalTree::from_raw(&coffee_raw()).expect("coffee tree is valid")
}

/// Directory holding JSON/TOML fixtures for tests.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load `tests/fixtures/<name>.json` through the schema-validating loader.
pub fn load_tree_fixture(name: &str) -> Result<GoalTree> {
    load_tree(&fixtures_dir().join(format!("{name}.json")))
}

/// Temporary directory with tree and query files for CLI tests.
pub struct TestWorkspace {
    dir: tempfile::TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the workspace and return its path.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Write the coffee tree as JSON.
    pub fn write_coffee_tree(&self) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(&coffee_raw()).context("serialize tree")?;
        self.write("tree.json", &json)
    }
}
