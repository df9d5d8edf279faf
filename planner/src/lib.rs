//! Goal tree plan evaluation for BDI-style agents.
//!
//! A goal tree of `ACT`/`SEQ`/`AND`/`OR` nodes is checked against a norm,
//! walked for belief-consistent execution traces, ranked by a cost preference
//! and explained. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure logic (annotation, enumeration, selection, explanation).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Tree and query loading, rendering.
//!
//! [`plan`] wires core logic and I/O together for the CLI.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod plan;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;
