//! Cost vectors, user preferences and lowest-cost trace selection.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::{Value, json};

use crate::core::trace::Trace;
use crate::core::types::QueryError;
use crate::tree::GoalTree;

/// Dimension labels, in vector order.
pub const DIMENSIONS: [&str; 3] = ["quality", "price", "time"];

/// `[quality, price, time]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostVector([f64; 3]);

impl CostVector {
    pub fn new(values: [f64; 3]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> [f64; 3] {
        self.0
    }

    pub fn get(&self, dimension: usize) -> f64 {
        self.0[dimension]
    }

    /// JSON array with integral values rendered as integers.
    pub fn as_value(&self) -> Value {
        Value::Array(self.0.iter().map(|v| number_value(*v)).collect())
    }
}

fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        json!(v as i64)
    } else {
        json!(v)
    }
}

impl Add for CostVector {
    type Output = CostVector;

    fn add(self, rhs: CostVector) -> CostVector {
        CostVector([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl fmt::Display for CostVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| number_value(*v).to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// A labelled lexicographic ordering over the cost dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preference {
    label: String,
    order: [usize; 3],
}

impl Preference {
    /// `order` must be a permutation of `0, 1, 2`.
    pub fn new(label: impl Into<String>, order: &[usize]) -> Result<Self, QueryError> {
        let valid = order.len() == 3 && (0..3).all(|dimension| order.contains(&dimension));
        if !valid {
            return Err(QueryError::InvalidPriority {
                order: order.to_vec(),
            });
        }
        Ok(Self {
            label: label.into(),
            order: [order[0], order[1], order[2]],
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn order(&self) -> [usize; 3] {
        self.order
    }

    /// Compare two cost vectors lexicographically in priority order.
    pub fn compare(&self, a: &CostVector, b: &CostVector) -> Ordering {
        self.order
            .iter()
            .map(|d| a.get(*d).partial_cmp(&b.get(*d)).unwrap_or(Ordering::Equal))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    pub fn as_value(&self) -> Value {
        json!([self.label, self.order])
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<&str> = self.order.iter().map(|d| DIMENSIONS[*d]).collect();
        write!(f, "{} ({})", self.label, dims.join(" > "))
    }
}

/// A trace with its aggregate cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrace {
    pub trace: Trace,
    pub cost: CostVector,
}

/// Outcome of selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// No candidate traces: no feasible plan.
    NoPlan,
    Chosen(Plan),
}

/// The chosen trace and every alternative that lost.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub selected: ScoredTrace,
    /// Remaining traces in ranked order, cost ties included.
    pub rejected: Vec<ScoredTrace>,
    /// Number of traces that shared the minimum cost (selected included).
    pub ties: usize,
}

/// Sum the costs of every action node in `trace`.
pub fn trace_cost(tree: &GoalTree, trace: &Trace) -> CostVector {
    trace
        .steps
        .iter()
        .map(|id| tree.node(*id))
        .filter(|node| node.is_action())
        .filter_map(|node| node.costs)
        .fold(CostVector::default(), |acc, cost| acc + cost)
}

/// Score and stable-sort traces by `preference`.
pub fn rank(tree: &GoalTree, traces: Vec<Trace>, preference: &Preference) -> Vec<ScoredTrace> {
    let mut scored: Vec<ScoredTrace> = traces
        .into_iter()
        .map(|trace| ScoredTrace {
            cost: trace_cost(tree, &trace),
            trace,
        })
        .collect();
    scored.sort_by(|a, b| preference.compare(&a.cost, &b.cost));
    scored
}

/// Pick the lowest-cost trace, breaking exact cost ties uniformly at random.
pub fn select<R: Rng + ?Sized>(
    tree: &GoalTree,
    traces: Vec<Trace>,
    preference: &Preference,
    rng: &mut R,
) -> Selection {
    let mut ranked = rank(tree, traces, preference);
    let Some(best) = ranked.first().map(|scored| scored.cost) else {
        return Selection::NoPlan;
    };
    let tied: Vec<usize> = ranked
        .iter()
        .enumerate()
        .filter(|(_, scored)| scored.cost == best)
        .map(|(position, _)| position)
        .collect();
    let pick = tied.choose(rng).copied().unwrap_or(0);
    let selected = ranked.remove(pick);
    Selection::Chosen(Plan {
        selected,
        rejected: ranked,
        ties: tied.len(),
    })
}
