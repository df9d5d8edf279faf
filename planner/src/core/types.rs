//! Shared query-scoped types for the planning core.
//!
//! These types carry the per-query inputs (beliefs, goal, precondition rule)
//! through annotation, enumeration and explanation. They hold no global state.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Belief tokens the agent currently holds true.
pub type Beliefs = BTreeSet<String>;

/// Errors raised while assembling a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("priority order must be a permutation of [0, 1, 2] (got {order:?})")]
    InvalidPriority { order: Vec<usize> },
    #[error("invalid goal pattern '{pattern}'")]
    InvalidGoalPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("start node '{name}' not found in tree")]
    UnknownStart { name: String },
}

/// Goal-matching rule, checked against the beliefs after each action.
#[derive(Debug, Clone)]
pub enum Goal {
    /// Achieved when the token is believed.
    Token(String),
    /// Achieved when any belief matches the pattern.
    Pattern(Regex),
}

impl Goal {
    pub fn token(token: impl Into<String>) -> Self {
        Goal::Token(token.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, QueryError> {
        Regex::new(pattern)
            .map(Goal::Pattern)
            .map_err(|source| QueryError::InvalidGoalPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn is_achieved(&self, beliefs: &Beliefs) -> bool {
        match self {
            Goal::Token(token) => beliefs.contains(token),
            Goal::Pattern(re) => beliefs.iter().any(|belief| re.is_match(belief)),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Token(token) => f.write_str(token),
            Goal::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// How an action's preconditions are tested against beliefs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreconditionMode {
    /// Every precondition must be believed.
    #[default]
    All,
    /// At least one precondition must be believed. Legacy behavior.
    Any,
}

impl PreconditionMode {
    /// Empty preconditions are always satisfied.
    pub fn satisfied(self, pre: &[String], beliefs: &Beliefs) -> bool {
        if pre.is_empty() {
            return true;
        }
        match self {
            PreconditionMode::All => pre.iter().all(|p| beliefs.contains(p)),
            PreconditionMode::Any => pre.iter().any(|p| beliefs.contains(p)),
        }
    }
}

/// Build a belief set from string-like tokens.
pub fn beliefs<I, S>(tokens: I) -> Beliefs
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tokens.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_goal_requires_membership() {
        let goal = Goal::token("haveCoffee");
        assert!(!goal.is_achieved(&beliefs(["haveMoney"])));
        assert!(goal.is_achieved(&beliefs(["haveMoney", "haveCoffee"])));
    }

    #[test]
    fn pattern_goal_matches_any_belief() {
        let goal = Goal::pattern("^have(Coffee|Tea)$").expect("pattern");
        assert!(goal.is_achieved(&beliefs(["haveTea"])));
        assert!(!goal.is_achieved(&beliefs(["haveTeaBag"])));
        assert!(Goal::pattern("(").is_err());
    }

    #[test]
    fn all_and_any_preconditions_differ_on_partial_match() {
        let pre = vec!["haveCard".to_string(), "atKitchen".to_string()];
        let partial = beliefs(["haveCard"]);
        assert!(!PreconditionMode::All.satisfied(&pre, &partial));
        assert!(PreconditionMode::Any.satisfied(&pre, &partial));
        assert!(PreconditionMode::All.satisfied(&[], &Beliefs::new()));
        assert!(PreconditionMode::Any.satisfied(&[], &Beliefs::new()));
    }
}
