//! Explanation factors for a selected plan.
//!
//! Factors are produced in a fixed, user-facing order: the selected trace is
//! walked step by step (choices at `OR` nodes, preconditions of actions up to
//! the explained one, the link chain at the explained action), followed by the
//! goal hierarchy above the action and finally the user preference.
//!
//! Feasibility of a rejected `OR` alternative is judged against the beliefs
//! held when the choice was made, not the beliefs at the end of the trace.
//! Actions without preconditions contribute no `P` factor.

use std::collections::HashSet;

use serde_json::{Value, json};

use crate::core::cost::{CostVector, Preference, ScoredTrace};
use crate::core::norm::Norm;
use crate::tree::{GoalTree, NodeId, NodeKind};

/// One tagged reason contributing to why an action was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    /// `C`: the child taken at an `OR` node, with its preconditions.
    Choice { chosen: String, pre: Vec<String> },
    /// `N`: an alternative excluded by the active norm.
    Norm { alternative: String, norm: Norm },
    /// `V`: the chosen option was cheaper under the preference.
    Value {
        chosen: String,
        chosen_cost: CostVector,
        alternative: String,
        alternative_cost: CostVector,
    },
    /// `F`: an alternative whose preconditions were not believed.
    Feasibility {
        alternative: String,
        missing: Vec<String>,
    },
    /// `P`: preconditions of an action executed up to the explained one.
    Precondition { action: String, pre: Vec<String> },
    /// `L`: one hop of the explained action's link chain.
    Link { from: String, to: String },
    /// `D`: a goal the explained action contributes to.
    Desire { goal: String },
    /// `U`: the preference used for selection.
    UserPreference { preference: Preference },
}

impl Factor {
    pub fn tag(&self) -> char {
        match self {
            Factor::Choice { .. } => 'C',
            Factor::Norm { .. } => 'N',
            Factor::Value { .. } => 'V',
            Factor::Feasibility { .. } => 'F',
            Factor::Precondition { .. } => 'P',
            Factor::Link { .. } => 'L',
            Factor::Desire { .. } => 'D',
            Factor::UserPreference { .. } => 'U',
        }
    }

    /// Tagged tuple form, e.g. `["C", "getShopCoffee", ["haveMoney"]]`.
    pub fn as_value(&self) -> Value {
        match self {
            Factor::Choice { chosen, pre } => json!(["C", chosen, pre]),
            Factor::Norm { alternative, norm } => json!(["N", alternative, norm.to_string()]),
            Factor::Value {
                chosen,
                chosen_cost,
                alternative,
                alternative_cost,
            } => json!([
                "V",
                chosen,
                chosen_cost.as_value(),
                ">",
                alternative,
                alternative_cost.as_value()
            ]),
            Factor::Feasibility {
                alternative,
                missing,
            } => json!(["F", alternative, missing]),
            Factor::Precondition { action, pre } => json!(["P", action, pre]),
            Factor::Link { from, to } => json!(["L", from, "->", to]),
            Factor::Desire { goal } => json!(["D", goal]),
            Factor::UserPreference { preference } => json!(["U", preference.as_value()]),
        }
    }
}

/// Inputs shared by every factor rule.
struct Context<'a> {
    tree: &'a GoalTree,
    selected: &'a ScoredTrace,
    norm: &'a Norm,
    rejected: &'a [ScoredTrace],
}

/// Explain why `action` is part of the selected plan.
///
/// Returns an empty list when `action` is not an action node of `tree` or is
/// not part of the selected trace.
pub fn explain(
    tree: &GoalTree,
    selected: &ScoredTrace,
    action: &str,
    norm: &Norm,
    preference: &Preference,
    rejected: &[ScoredTrace],
) -> Vec<Factor> {
    let Some(action_id) = tree.find(action).filter(|id| tree.node(*id).is_action()) else {
        return Vec::new();
    };
    let Some(action_position) = selected.trace.position(action_id) else {
        return Vec::new();
    };
    let ctx = Context {
        tree,
        selected,
        norm,
        rejected,
    };

    let walk = selected
        .trace
        .steps
        .iter()
        .enumerate()
        .flat_map(|(position, id)| {
            let node = tree.node(*id);
            let mut factors = match node.kind {
                NodeKind::Or => ctx.choice_factors(*id, position),
                NodeKind::Act if position <= action_position && !node.pre.is_empty() => {
                    vec![Factor::Precondition {
                        action: node.name.clone(),
                        pre: node.pre.clone(),
                    }]
                }
                _ => Vec::new(),
            };
            if *id == action_id {
                factors.extend(link_factors(tree, action_id));
            }
            factors
        });
    let desires = tree
        .ancestors(action_id)
        .filter(|id| tree.node(*id).kind.is_composite())
        .map(|id| Factor::Desire {
            goal: tree.name(id).to_string(),
        });

    walk.chain(desires)
        .chain(std::iter::once(Factor::UserPreference {
            preference: preference.clone(),
        }))
        .collect()
}

impl Context<'_> {
    /// `C` for the chosen child, then one of `N`, `V`, `F` per alternative.
    fn choice_factors(&self, or_id: NodeId, position: usize) -> Vec<Factor> {
        let children = self.tree.children(or_id);
        let Some(chosen) = children
            .iter()
            .copied()
            .find(|child| self.selected.trace.contains(*child))
        else {
            return Vec::new();
        };
        let chosen_node = self.tree.node(chosen);
        let choice = Factor::Choice {
            chosen: chosen_node.name.clone(),
            pre: chosen_node.pre.clone(),
        };
        std::iter::once(choice)
            .chain(
                children
                    .iter()
                    .filter(|child| **child != chosen)
                    .filter_map(|alternative| {
                        self.rejection_reason(chosen, *alternative, position)
                    }),
            )
            .collect()
    }

    /// The first applicable reason, in priority order norm, value, feasibility.
    fn rejection_reason(
        &self,
        chosen: NodeId,
        alternative: NodeId,
        position: usize,
    ) -> Option<Factor> {
        self.norm_reason(alternative)
            .or_else(|| self.value_reason(chosen, alternative))
            .or_else(|| self.feasibility_reason(alternative, position))
    }

    fn norm_reason(&self, alternative: NodeId) -> Option<Factor> {
        let node = self.tree.node(alternative);
        node.violation.then(|| Factor::Norm {
            alternative: node.name.clone(),
            norm: self.norm.clone(),
        })
    }

    /// Compare direct costs when both nodes carry them, otherwise the selected
    /// trace against the best rejected trace passing through the alternative.
    fn value_reason(&self, chosen: NodeId, alternative: NodeId) -> Option<Factor> {
        let chosen_node = self.tree.node(chosen);
        let alternative_node = self.tree.node(alternative);
        let (chosen_cost, alternative_cost) = match (chosen_node.costs, alternative_node.costs) {
            (Some(chosen_cost), Some(alternative_cost)) => (chosen_cost, alternative_cost),
            _ => {
                let rival = self
                    .rejected
                    .iter()
                    .find(|scored| scored.trace.contains(alternative))?;
                (self.selected.cost, rival.cost)
            }
        };
        Some(Factor::Value {
            chosen: chosen_node.name.clone(),
            chosen_cost,
            alternative: alternative_node.name.clone(),
            alternative_cost,
        })
    }

    /// Preconditions of `alternative` not held at the `OR` step at `position`.
    fn feasibility_reason(&self, alternative: NodeId, position: usize) -> Option<Factor> {
        let node = self.tree.node(alternative);
        let held = self.selected.trace.beliefs_before(self.tree, position);
        let missing: Vec<String> = node
            .pre
            .iter()
            .filter(|p| !held.contains(*p))
            .cloned()
            .collect();
        (!missing.is_empty()).then(|| Factor::Feasibility {
            alternative: node.name.clone(),
            missing,
        })
    }
}

/// Follow `link` hop by hop from `start`.
///
/// Every listed target of the current node yields an edge; the walk moves to
/// the last target present in the tree and stops when none is or it repeats.
fn link_factors(tree: &GoalTree, start: NodeId) -> Vec<Factor> {
    let mut factors = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut current = start;
    loop {
        let node = tree.node(current);
        factors.extend(node.link.iter().map(|target| Factor::Link {
            from: node.name.clone(),
            to: target.clone(),
        }));
        let next = node.link.iter().rev().find_map(|target| tree.find(target));
        match next {
            Some(id) if visited.insert(id) => current = id,
            _ => break,
        }
    }
    factors
}
