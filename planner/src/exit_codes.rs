//! Stable exit codes for planner CLI commands.

/// Command succeeded (a plan was selected, or annotation/enumeration printed).
pub const OK: i32 = 0;
/// Command failed due to an invalid tree, query file or other errors.
pub const INVALID: i32 = 1;
/// `planner plan` found no trace reaching the goal.
pub const NO_PLAN: i32 = 2;
