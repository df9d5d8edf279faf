//! Planning pipeline for `planner plan`: annotate, enumerate, select, explain.

use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::core::cost::{Plan, Preference, ScoredTrace, Selection, select};
use crate::core::explain::{Factor, explain};
use crate::core::norm::{Norm, annotate};
use crate::core::trace::{EnumerateOptions, enumerate};
use crate::core::types::{Beliefs, Goal, QueryError};
use crate::io::config::load_query;
use crate::io::tree_store::load_tree;
use crate::tree::{GoalTree, NodeId};

/// Request-scoped inputs for one planning run.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub start: Option<String>,
    pub beliefs: Beliefs,
    pub goal: Goal,
    pub norm: Norm,
    pub preference: Preference,
    pub action: Option<String>,
    pub options: EnumerateOptions,
    pub seed: Option<u64>,
}

/// Structured planning outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// No trace reaches the goal.
    NoPlan,
    Planned(PlanReport),
}

/// Selected plan with alternatives and explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    pub selected: ScoredTrace,
    pub rejected: Vec<ScoredTrace>,
    /// Traces sharing the minimum cost, selected included.
    pub ties: usize,
    /// Empty when no action was requested or it is not part of the plan.
    pub explanation: Vec<Factor>,
}

impl PlanReport {
    /// JSON view with node names in place of ids.
    pub fn as_value(&self, tree: &GoalTree) -> Value {
        let scored = |s: &ScoredTrace| {
            json!({
                "trace": s.trace.names(tree),
                "cost": s.cost.as_value(),
            })
        };
        json!({
            "selected": scored(&self.selected),
            "ties": self.ties,
            "rejected": self.rejected.iter().map(scored).collect::<Vec<_>>(),
            "explanation": self.explanation.iter().map(Factor::as_value).collect::<Vec<_>>(),
        })
    }
}

impl PlanRequest {
    /// Resolve the start node, defaulting to the tree root.
    pub fn start_node(&self, tree: &GoalTree) -> Result<NodeId, QueryError> {
        match &self.start {
            None => Ok(tree.root()),
            Some(name) => tree.find(name).ok_or_else(|| QueryError::UnknownStart {
                name: name.clone(),
            }),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Run the full pipeline on `tree`, annotating it in place.
pub fn run_plan(tree: &mut GoalTree, request: &PlanRequest) -> Result<PlanOutcome> {
    let mut rng = request.rng();
    run_plan_with_rng(tree, request, &mut rng)
}

/// Like [`run_plan`] with an explicit tie-break RNG.
pub fn run_plan_with_rng<R: Rng + ?Sized>(
    tree: &mut GoalTree,
    request: &PlanRequest,
    rng: &mut R,
) -> Result<PlanOutcome> {
    let start = request.start_node(tree)?;
    annotate(tree, &request.norm);
    debug!(norm = %request.norm, root_violation = tree.node(tree.root()).violation, "tree annotated");

    let traces = enumerate(tree, start, &request.beliefs, &request.goal, request.options);
    debug!(candidates = traces.len(), goal = %request.goal, "traces enumerated");

    let Plan {
        selected,
        rejected,
        ties,
    } = match select(tree, traces, &request.preference, rng) {
        Selection::NoPlan => {
            info!(goal = %request.goal, "no feasible plan");
            return Ok(PlanOutcome::NoPlan);
        }
        Selection::Chosen(plan) => plan,
    };
    info!(
        cost = %selected.cost,
        ties,
        rejected = rejected.len(),
        preference = %request.preference,
        "plan selected"
    );

    let explanation = match &request.action {
        Some(action) => explain(
            tree,
            &selected,
            action,
            &request.norm,
            &request.preference,
            &rejected,
        ),
        None => Vec::new(),
    };
    if let Some(action) = &request.action {
        debug!(action = action.as_str(), factors = explanation.len(), "explanation generated");
    }

    Ok(PlanOutcome::Planned(PlanReport {
        selected,
        rejected,
        ties,
        explanation,
    }))
}

/// Load tree and query from disk and run the pipeline.
pub fn plan_from_files(tree_path: &Path, query_path: &Path) -> Result<(GoalTree, PlanOutcome)> {
    let mut tree = load_tree(tree_path).context("load tree for planning")?;
    let request = load_query(query_path)?
        .to_request()
        .context("build plan request")?;
    let outcome = run_plan(&mut tree, &request)?;
    Ok((tree, outcome))
}
