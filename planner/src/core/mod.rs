//! Deterministic, pure plan-evaluation logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! trees and return outputs suitable for tests. The only nondeterminism is the
//! cost tie-break, which draws from a caller-supplied RNG.

pub mod cost;
pub mod explain;
pub mod invariants;
pub mod norm;
pub mod path;
pub mod trace;
pub mod types;
