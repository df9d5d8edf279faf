//! Query configuration stored as TOML.
//!
//! A query file names the beliefs, goal, norm, preference and the action to
//! explain for one planning run:
//!
//! ```toml
//! beliefs = ["ownCard", "haveMoney"]
//! goal = "haveCoffee"            # or: goal = { pattern = "^have" }
//! action = "getCoffeeShop"
//!
//! [norm]
//! type = "P"
//! actions = ["gotoKitchen"]
//!
//! [preference]
//! label = "cheapest first"
//! order = [1, 2, 0]
//!
//! [options]
//! preconditions = "all"
//! seed = 7
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::cost::Preference;
use crate::core::norm::Norm;
use crate::core::trace::EnumerateOptions;
use crate::core::types::{Goal, PreconditionMode, beliefs};
use crate::plan::PlanRequest;

/// Query configuration (TOML). Missing sections fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    /// Node to start enumeration from; the tree root when unset.
    pub start: Option<String>,
    pub beliefs: Vec<String>,
    pub goal: GoalConfig,
    /// Action to explain; no explanation is produced when unset.
    pub action: Option<String>,
    pub norm: Norm,
    pub preference: PreferenceConfig,
    pub options: OptionsConfig,
}

/// Goal as an exact belief token or a regular expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GoalConfig {
    Token(String),
    Pattern { pattern: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreferenceConfig {
    pub label: String,
    /// Permutation of `0` (quality), `1` (price), `2` (time).
    pub order: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OptionsConfig {
    pub preconditions: PreconditionMode,
    /// Seed for the cost tie-break; entropy-seeded when unset.
    pub seed: Option<u64>,
}

impl Default for GoalConfig {
    fn default() -> Self {
        GoalConfig::Token(String::new())
    }
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            order: vec![0, 1, 2],
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            start: None,
            beliefs: Vec::new(),
            goal: GoalConfig::default(),
            action: None,
            norm: Norm::default(),
            preference: PreferenceConfig::default(),
            options: OptionsConfig::default(),
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<()> {
        match &self.goal {
            GoalConfig::Token(token) if token.trim().is_empty() => {
                return Err(anyhow!("goal must be a non-empty token or {{ pattern = ... }}"));
            }
            GoalConfig::Pattern { pattern } if pattern.trim().is_empty() => {
                return Err(anyhow!("goal.pattern must be non-empty"));
            }
            _ => {}
        }
        if matches!(&self.start, Some(start) if start.trim().is_empty()) {
            return Err(anyhow!("start must be non-empty when set"));
        }
        if matches!(&self.action, Some(action) if action.trim().is_empty()) {
            return Err(anyhow!("action must be non-empty when set"));
        }
        Preference::new(self.preference.label.clone(), &self.preference.order)?;
        self.goal()?;
        Ok(())
    }

    pub fn goal(&self) -> Result<Goal> {
        Ok(match &self.goal {
            GoalConfig::Token(token) => Goal::token(token.clone()),
            GoalConfig::Pattern { pattern } => Goal::pattern(pattern)?,
        })
    }

    /// Build the request-scoped context for one planning run.
    pub fn to_request(&self) -> Result<PlanRequest> {
        self.validate()?;
        Ok(PlanRequest {
            start: self.start.clone(),
            beliefs: beliefs(self.beliefs.iter().cloned()),
            goal: self.goal()?,
            norm: self.norm.clone(),
            preference: Preference::new(self.preference.label.clone(), &self.preference.order)?,
            action: self.action.clone(),
            options: EnumerateOptions {
                preconditions: self.options.preconditions,
            },
            seed: self.options.seed,
        })
    }
}

/// Load and validate a query file.
pub fn load_query(path: &Path) -> Result<QueryConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_query(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Parse and validate query TOML text.
pub fn parse_query(contents: &str) -> Result<QueryConfig> {
    let cfg: QueryConfig = toml::from_str(contents).context("parse query toml")?;
    cfg.validate()?;
    Ok(cfg)
}
