//! I/O helpers for planner commands.

pub mod config;
pub mod render;
pub mod tree_store;
