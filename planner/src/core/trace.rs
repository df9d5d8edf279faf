//! Execution trace enumeration.
//!
//! [`enumerate`] walks an annotated tree and produces every belief-consistent,
//! norm-respecting trace that reaches the goal. Composite nodes are recorded in
//! the trace ahead of their children so explanations can inspect `OR` choices.
//!
//! Within a `SEQ`/`AND` node only the first successful continuation of each
//! child is carried forward. Alternatives nested below a sequence therefore
//! contribute one path, not every combination; [`structural_traces`] gives the
//! full combinatorial view when beliefs and norms are irrelevant.

use serde::{Deserialize, Serialize};

use crate::core::types::{Beliefs, Goal, PreconditionMode};
use crate::tree::{GoalTree, NodeId, NodeKind};

/// One concrete, realizable run of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// Visited nodes in execution order, composites included.
    pub steps: Vec<NodeId>,
    /// Beliefs held before the first step.
    pub initial: Beliefs,
    /// Beliefs held after the last step.
    pub beliefs: Beliefs,
}

impl Trace {
    pub fn names(&self, tree: &GoalTree) -> Vec<String> {
        self.steps
            .iter()
            .map(|id| tree.name(*id).to_string())
            .collect()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.steps.iter().position(|step| *step == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.steps.contains(&id)
    }

    /// Beliefs held just before the step at `position` runs.
    pub fn beliefs_before(&self, tree: &GoalTree, position: usize) -> Beliefs {
        let mut held = self.initial.clone();
        for id in self.steps.iter().take(position) {
            let node = tree.node(*id);
            if node.is_action() {
                held.extend(node.post.iter().cloned());
            }
        }
        held
    }
}

/// Enumeration knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerateOptions {
    pub preconditions: PreconditionMode,
}

/// Partial run under construction.
#[derive(Debug, Clone)]
struct Branch {
    steps: Vec<NodeId>,
    beliefs: Beliefs,
    achieved: bool,
}

struct Walker<'a> {
    tree: &'a GoalTree,
    goal: &'a Goal,
    options: EnumerateOptions,
}

/// Enumerate goal-reaching traces from `start`.
///
/// `beliefs` is the initial belief set; it is never mutated. Returns an empty
/// list when no trace reaches the goal.
pub fn enumerate(
    tree: &GoalTree,
    start: NodeId,
    beliefs: &Beliefs,
    goal: &Goal,
    options: EnumerateOptions,
) -> Vec<Trace> {
    let walker = Walker {
        tree,
        goal,
        options,
    };
    let initial = Branch {
        steps: Vec::new(),
        beliefs: beliefs.clone(),
        achieved: false,
    };
    walker
        .explore(start, initial)
        .into_iter()
        .filter(|branch| branch.achieved)
        .map(|branch| Trace {
            steps: branch.steps,
            initial: beliefs.clone(),
            beliefs: branch.beliefs,
        })
        .collect()
}

impl Walker<'_> {
    fn explore(&self, id: NodeId, branch: Branch) -> Vec<Branch> {
        let node = self.tree.node(id);
        if node.violation {
            return Vec::new();
        }
        match node.kind {
            NodeKind::Act => self.execute(id, branch).into_iter().collect(),
            NodeKind::Or => self
                .tree
                .children(id)
                .iter()
                .flat_map(|child| {
                    let mut alternative = branch.clone();
                    alternative.steps.push(id);
                    self.explore(*child, alternative)
                })
                .collect(),
            NodeKind::Seq | NodeKind::And => self.sequence(id, branch).into_iter().collect(),
            NodeKind::Unknown(_) => Vec::new(),
        }
    }

    fn execute(&self, id: NodeId, mut branch: Branch) -> Option<Branch> {
        let node = self.tree.node(id);
        if !self
            .options
            .preconditions
            .satisfied(&node.pre, &branch.beliefs)
        {
            return None;
        }
        branch.steps.push(id);
        branch.beliefs.extend(node.post.iter().cloned());
        branch.achieved |= self.goal.is_achieved(&branch.beliefs);
        Some(branch)
    }

    fn sequence(&self, id: NodeId, mut branch: Branch) -> Option<Branch> {
        branch.steps.push(id);
        for child in self.tree.ordered_children(id) {
            if branch.achieved {
                break;
            }
            branch = self.explore(child, branch).into_iter().next()?;
        }
        Some(branch)
    }
}

/// Every root-to-leaf run from `start`, ignoring beliefs and norms.
///
/// `SEQ`/`AND` nodes combine their ordered children's runs as a cartesian
/// product; `OR` nodes concatenate their children's runs.
pub fn structural_traces(tree: &GoalTree, start: NodeId) -> Vec<Vec<NodeId>> {
    match tree.node(start).kind {
        NodeKind::Act => vec![vec![start]],
        NodeKind::Seq | NodeKind::And => {
            let mut accumulated: Vec<Vec<NodeId>> = vec![vec![start]];
            for child in tree.ordered_children(start) {
                let child_traces = structural_traces(tree, child);
                accumulated = accumulated
                    .iter()
                    .flat_map(|prefix| {
                        child_traces.iter().map(move |suffix| {
                            let mut combined = prefix.clone();
                            combined.extend_from_slice(suffix);
                            combined
                        })
                    })
                    .collect();
            }
            accumulated
        }
        NodeKind::Or => tree
            .children(start)
            .iter()
            .flat_map(|child| structural_traces(tree, *child))
            .map(|suffix| {
                let mut combined = Vec::with_capacity(suffix.len() + 1);
                combined.push(start);
                combined.extend(suffix);
                combined
            })
            .collect(),
        NodeKind::Unknown(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::norm::{Norm, annotate};
    use crate::core::types::beliefs;
    use crate::test_support::{act, coffee_tree, composite};

    fn names(tree: &GoalTree, traces: &[Trace]) -> Vec<Vec<String>> {
        traces.iter().map(|trace| trace.names(tree)).collect()
    }

    fn coffee_traces(norm: &Norm, initial: &Beliefs) -> (GoalTree, Vec<Trace>) {
        let mut tree = coffee_tree();
        annotate(&mut tree, norm);
        let traces = enumerate(
            &tree,
            tree.root(),
            initial,
            &Goal::token("haveCoffee"),
            EnumerateOptions::default(),
        );
        (tree, traces)
    }

    #[test]
    fn prohibited_kitchen_leaves_only_shop_for_card_and_money() {
        let (tree, traces) = coffee_traces(
            &Norm::prohibition(["gotoKitchen"]),
            &beliefs(["ownCard", "haveMoney"]),
        );
        assert_eq!(
            names(&tree, &traces),
            vec![vec![
                "getCoffee",
                "getShopCoffee",
                "gotoShop",
                "payShop",
                "getCoffeeShop"
            ]]
        );
        let beliefs_after = &traces[0].beliefs;
        assert!(beliefs_after.contains("haveCoffee"));
        assert!(beliefs_after.contains("ownCard"));
    }

    #[test]
    fn sequence_carries_first_alternative_only() {
        let (tree, traces) = coffee_traces(
            &Norm::default(),
            &beliefs(["ownCard", "colleagueAvailable", "haveMoney", "AnnInOffice"]),
        );
        assert_eq!(
            names(&tree, &traces),
            vec![
                vec![
                    "getCoffee",
                    "getKitchenCoffee",
                    "getStaffCard",
                    "getOwnCard",
                    "gotoKitchen",
                    "getCoffeeKitchen"
                ],
                vec![
                    "getCoffee",
                    "getAnnOfficeCoffee",
                    "gotoAnnOffice",
                    "getPod",
                    "getCoffeeAnnOffice"
                ],
                vec![
                    "getCoffee",
                    "getShopCoffee",
                    "gotoShop",
                    "payShop",
                    "getCoffeeShop"
                ],
            ]
        );
    }

    #[test]
    fn later_alternative_used_when_first_is_infeasible() {
        let (tree, traces) =
            coffee_traces(&Norm::default(), &beliefs(["colleagueAvailable"]));
        assert_eq!(
            names(&tree, &traces),
            vec![vec![
                "getCoffee",
                "getKitchenCoffee",
                "getStaffCard",
                "getOthersCard",
                "gotoKitchen",
                "getCoffeeKitchen"
            ]]
        );
    }

    #[test]
    fn no_beliefs_means_no_plan() {
        let (_, traces) = coffee_traces(&Norm::default(), &Beliefs::new());
        assert!(traces.is_empty());
    }

    #[test]
    fn every_action_satisfies_preconditions_from_its_own_prefix() {
        let initial = beliefs(["ownCard", "colleagueAvailable", "haveMoney", "AnnInOffice"]);
        let (tree, traces) = coffee_traces(&Norm::default(), &initial);
        assert!(!traces.is_empty());
        for trace in &traces {
            let mut held = initial.clone();
            for id in &trace.steps {
                let node = tree.node(*id);
                if !node.is_action() {
                    continue;
                }
                assert!(
                    PreconditionMode::All.satisfied(&node.pre, &held),
                    "{} executed without its preconditions",
                    node.name
                );
                held.extend(node.post.iter().cloned());
            }
        }
    }

    #[test]
    fn any_mode_accepts_partial_preconditions() {
        let raw = composite(
            NodeKind::Seq,
            "root",
            vec![act("finish", &["a", "b"], &["done"], [0.0; 3])],
        );
        let tree = GoalTree::from_raw(&raw).expect("tree");
        let goal = Goal::token("done");
        let initial = beliefs(["a"]);

        let strict = enumerate(&tree, tree.root(), &initial, &goal, EnumerateOptions::default());
        assert!(strict.is_empty());

        let lenient = enumerate(
            &tree,
            tree.root(),
            &initial,
            &goal,
            EnumerateOptions {
                preconditions: PreconditionMode::Any,
            },
        );
        assert_eq!(lenient.len(), 1);
    }

    #[test]
    fn sequence_stops_once_goal_is_reached() {
        let raw = composite(
            NodeKind::Seq,
            "root",
            vec![
                act("early", &[], &["goal"], [1.0, 0.0, 0.0]),
                act("late", &["missing"], &[], [1.0, 0.0, 0.0]),
            ],
        );
        let tree = GoalTree::from_raw(&raw).expect("tree");
        let traces = enumerate(
            &tree,
            tree.root(),
            &Beliefs::new(),
            &Goal::token("goal"),
            EnumerateOptions::default(),
        );
        assert_eq!(names(&tree, &traces), vec![vec!["root", "early"]]);
    }

    fn and_tree() -> GoalTree {
        // Declared out of order; `sequence` puts `a` first.
        let mut b = act("b", &["x"], &["goal"], [0.0, 1.0, 0.0]);
        b.sequence = Some(2);
        let mut a = act("a", &[], &["x"], [0.0, 0.0, 1.0]);
        a.sequence = Some(1);
        let raw = composite(NodeKind::And, "root", vec![b, a]);
        GoalTree::from_raw(&raw).expect("tree")
    }

    #[test]
    fn and_runs_in_sequence_order_carrying_beliefs() {
        let tree = and_tree();
        let traces = enumerate(
            &tree,
            tree.root(),
            &Beliefs::new(),
            &Goal::token("goal"),
            EnumerateOptions::default(),
        );
        assert_eq!(names(&tree, &traces), vec![vec!["root", "a", "b"]]);
        assert!(traces[0].beliefs.contains("x"));
        assert!(traces[0].initial.is_empty());
        assert!(!traces[0].beliefs_before(&tree, 2).contains("goal"));
        assert!(traces[0].beliefs_before(&tree, 2).contains("x"));
        assert!(traces[0].beliefs_before(&tree, 3).contains("goal"));
    }

    #[test]
    fn and_fails_when_a_child_cannot_run() {
        let raw = composite(
            NodeKind::And,
            "root",
            vec![
                act("a", &[], &["x"], [0.0; 3]),
                act("b", &["y"], &["goal"], [0.0; 3]),
            ],
        );
        let tree = GoalTree::from_raw(&raw).expect("tree");
        let traces = enumerate(
            &tree,
            tree.root(),
            &Beliefs::new(),
            &Goal::token("goal"),
            EnumerateOptions::default(),
        );
        assert!(traces.is_empty());
    }

    #[test]
    fn prohibited_and_child_removes_the_whole_node() {
        let mut tree = and_tree();
        annotate(&mut tree, &Norm::prohibition(["b"]));
        let traces = enumerate(
            &tree,
            tree.root(),
            &Beliefs::new(),
            &Goal::token("goal"),
            EnumerateOptions::default(),
        );
        assert!(traces.is_empty());
    }

    #[test]
    fn structural_enumeration_combines_and_children() {
        let raw = composite(
            NodeKind::And,
            "root",
            vec![
                composite(
                    NodeKind::Or,
                    "pick",
                    vec![
                        act("left", &[], &[], [0.0; 3]),
                        act("right", &[], &[], [0.0; 3]),
                    ],
                ),
                act("finish", &[], &[], [0.0; 3]),
            ],
        );
        let tree = GoalTree::from_raw(&raw).expect("tree");
        let runs: Vec<Vec<&str>> = structural_traces(&tree, tree.root())
            .into_iter()
            .map(|run| run.into_iter().map(|id| tree.name(id)).collect())
            .collect();
        assert_eq!(
            runs,
            vec![
                vec!["root", "pick", "left", "finish"],
                vec!["root", "pick", "right", "finish"],
            ]
        );
    }

    #[test]
    fn unknown_nodes_yield_nothing() {
        let mut raw = act("odd", &[], &["goal"], [0.0; 3]);
        raw.kind = NodeKind::Unknown("XOR".to_string());
        let tree = GoalTree::from_raw(&raw).expect("tree");
        let traces = enumerate(
            &tree,
            tree.root(),
            &Beliefs::new(),
            &Goal::token("goal"),
            EnumerateOptions::default(),
        );
        assert!(traces.is_empty());
    }

    #[test]
    fn structural_enumeration_lists_four_coffee_runs() {
        let tree = coffee_tree();
        let runs: Vec<Vec<&str>> = structural_traces(&tree, tree.root())
            .into_iter()
            .map(|run| run.into_iter().map(|id| tree.name(id)).collect())
            .collect();
        assert_eq!(
            runs,
            vec![
                vec![
                    "getCoffee",
                    "getKitchenCoffee",
                    "getStaffCard",
                    "getOwnCard",
                    "gotoKitchen",
                    "getCoffeeKitchen"
                ],
                vec![
                    "getCoffee",
                    "getKitchenCoffee",
                    "getStaffCard",
                    "getOthersCard",
                    "gotoKitchen",
                    "getCoffeeKitchen"
                ],
                vec![
                    "getCoffee",
                    "getAnnOfficeCoffee",
                    "gotoAnnOffice",
                    "getPod",
                    "getCoffeeAnnOffice"
                ],
                vec![
                    "getCoffee",
                    "getShopCoffee",
                    "gotoShop",
                    "payShop",
                    "getCoffeeShop"
                ],
            ]
        );
    }
}
