//! Goal tree planner CLI.
//!
//! Loads a goal tree (JSON) and a query (TOML), then annotates the tree with
//! norm violations, lists execution traces, or selects and explains a plan.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;

use planner::core::norm::{annotate, violations};
use planner::core::trace::structural_traces;
use planner::exit_codes;
use planner::io::config::load_query;
use planner::io::render::{Renderer, render_tree};
use planner::io::tree_store::{load_tree, tree_to_json};
use planner::logging;
use planner::plan::{PlanOutcome, run_plan};

#[derive(Parser)]
#[command(
    name = "planner",
    version,
    about = "Norm-aware goal tree planner with explanations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mark every node that violates the query's norm.
    Annotate {
        /// Goal tree JSON file.
        #[arg(long)]
        tree: PathBuf,
        /// Query TOML file (only `[norm]` is used).
        #[arg(long)]
        query: PathBuf,
        /// Print the annotated tree as JSON instead of a drawing.
        #[arg(long)]
        json: bool,
    },
    /// List every structural run through the tree, ignoring beliefs and norms.
    Traces {
        /// Goal tree JSON file.
        #[arg(long)]
        tree: PathBuf,
        /// Node to enumerate from (defaults to the root).
        #[arg(long)]
        start: Option<String>,
    },
    /// Select the lowest-cost plan and explain the query's action.
    Plan {
        /// Goal tree JSON file.
        #[arg(long)]
        tree: PathBuf,
        /// Query TOML file.
        #[arg(long)]
        query: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Annotate { tree, query, json } => cmd_annotate(tree, query, json),
        Command::Traces { tree, start } => cmd_traces(tree, start),
        Command::Plan { tree, query, json } => cmd_plan(tree, query, json),
    }
}

fn cmd_annotate(tree_path: PathBuf, query_path: PathBuf, as_json: bool) -> Result<i32> {
    let mut tree = load_tree(&tree_path)?;
    let query = load_query(&query_path)?;
    annotate(&mut tree, &query.norm);
    debug!(
        violating = violations(&tree).values().filter(|v| **v).count(),
        "annotation complete"
    );
    if as_json {
        print!("{}", tree_to_json(&tree)?);
    } else {
        print!("{}", render_tree(&tree));
    }
    Ok(exit_codes::OK)
}

fn cmd_traces(tree_path: PathBuf, start: Option<String>) -> Result<i32> {
    let tree = load_tree(&tree_path)?;
    let start_id = match &start {
        Some(name) => tree
            .find(name)
            .with_context(|| format!("start node '{name}' not found in tree"))?,
        None => tree.root(),
    };
    let runs: Vec<Vec<&str>> = structural_traces(&tree, start_id)
        .into_iter()
        .map(|run| run.into_iter().map(|id| tree.name(id)).collect())
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&runs).context("serialize traces")?
    );
    Ok(exit_codes::OK)
}

fn cmd_plan(tree_path: PathBuf, query_path: PathBuf, as_json: bool) -> Result<i32> {
    let mut tree = load_tree(&tree_path)?;
    let request = load_query(&query_path)?
        .to_request()
        .context("build plan request")?;
    let report = match run_plan(&mut tree, &request)? {
        PlanOutcome::NoPlan => {
            if as_json {
                println!("{}", json!({ "selected": null }));
            } else {
                println!("no feasible plan for {}", request.goal);
            }
            return Ok(exit_codes::NO_PLAN);
        }
        PlanOutcome::Planned(report) => report,
    };
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report.as_value(&tree)).context("serialize plan")?
        );
    } else {
        let renderer = Renderer::new()?;
        print!(
            "{}",
            renderer.render_plan(&tree, &request.goal, &report, request.action.as_deref())?
        );
    }
    Ok(exit_codes::OK)
}
