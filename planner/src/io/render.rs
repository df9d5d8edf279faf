//! Human-readable rendering of annotated trees and plan reports.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::cost::ScoredTrace;
use crate::core::explain::Factor;
use crate::core::path::path_of;
use crate::core::types::Goal;
use crate::plan::PlanReport;
use crate::tree::{GoalTree, NodeId};

const PLAN_TEMPLATE: &str = include_str!("templates/plan.md");

/// Trace summary for template rendering.
#[derive(Debug, Clone, Serialize)]
struct TraceContext {
    steps: Vec<String>,
    cost: String,
}

impl TraceContext {
    fn from_scored(tree: &GoalTree, scored: &ScoredTrace) -> Self {
        Self {
            steps: scored.trace.names(tree),
            cost: scored.cost.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ReasonContext {
    tag: char,
    text: String,
}

/// Template engine wrapper around minijinja.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("plan", PLAN_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the selected plan, alternatives and explanation.
    pub fn render_plan(
        &self,
        tree: &GoalTree,
        goal: &Goal,
        report: &PlanReport,
        action: Option<&str>,
    ) -> Result<String> {
        let template = self.env.get_template("plan")?;
        let reasons: Vec<ReasonContext> = report
            .explanation
            .iter()
            .map(|factor| ReasonContext {
                tag: factor.tag(),
                text: describe(factor),
            })
            .collect();
        let rendered = template.render(context! {
            goal => goal.to_string(),
            selected => TraceContext::from_scored(tree, &report.selected),
            ties => report.ties,
            rejected => report
                .rejected
                .iter()
                .map(|scored| TraceContext::from_scored(tree, scored))
                .collect::<Vec<_>>(),
            action => action,
            action_path => action.and_then(|name| path_of(tree, name)),
            reasons => reasons,
        })?;
        Ok(rendered)
    }
}

/// One-line description of a factor.
pub fn describe(factor: &Factor) -> String {
    match factor {
        Factor::Choice { chosen, pre } if pre.is_empty() => format!("chose {chosen}"),
        Factor::Choice { chosen, pre } => {
            format!("chose {chosen} (requires {})", pre.join(", "))
        }
        Factor::Norm { alternative, norm } => {
            format!("{alternative} is excluded by norm {norm}")
        }
        Factor::Value {
            chosen,
            chosen_cost,
            alternative,
            alternative_cost,
        } => format!("{chosen} {chosen_cost} is preferred over {alternative} {alternative_cost}"),
        Factor::Feasibility {
            alternative,
            missing,
        } => format!("{alternative} is not feasible: missing {}", missing.join(", ")),
        Factor::Precondition { action, pre } => {
            format!("{action} requires {}", pre.join(", "))
        }
        Factor::Link { from, to } => format!("{from} enables {to}"),
        Factor::Desire { goal } => format!("contributes to {goal}"),
        Factor::UserPreference { preference } => format!("ranked by preference {preference}"),
    }
}

/// Draw the tree with violation flags, one node per line.
///
/// ```text
/// getCoffee [OR] violation=false
/// ├── getKitchenCoffee [SEQ] violation=true
/// │   └── ...
/// ```
pub fn render_tree(tree: &GoalTree) -> String {
    let mut lines = vec![node_label(tree, tree.root())];
    render_children(tree, tree.root(), "", &mut lines);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_children(tree: &GoalTree, id: NodeId, prefix: &str, lines: &mut Vec<String>) {
    let children = tree.children(id);
    for (position, child) in children.iter().enumerate() {
        let last = position + 1 == children.len();
        let connector = if last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{connector}{}", node_label(tree, *child)));
        let extension = if last { "    " } else { "│   " };
        render_children(tree, *child, &format!("{prefix}{extension}"), lines);
    }
}

fn node_label(tree: &GoalTree, id: NodeId) -> String {
    let node = tree.node(id);
    format!(
        "{} [{}] violation={}",
        node.name,
        node.kind.as_str(),
        node.violation
    )
}
