//! `modx`: multi-module discovery and dependency-ordered task execution for Go workspaces.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
