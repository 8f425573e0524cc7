//! # System Interaction Layer
//!
//! This module is the boundary between the workspace logic and process management.
//!
//! ## Modules
//!
//! - **`executor`**: The command-runner capabilities (`CommandRunner`, `DirRunner`) and the
//!   `SystemRunner` backend that spawns external tools such as `go` or `golangci-lint`.
//! - **`module_runner`**: Runs a command with a module's directory as the working directory,
//!   using directory-scoped spawning when the runner supports it and a lock-guarded
//!   change/run/restore sequence otherwise.

pub mod executor;
pub mod module_runner;
