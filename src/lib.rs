//! # grove
//!
//! `grove` manages a tree of nested git submodules. It powers the `grove`
//! CLI tool.
//!
//! ## Core Features
//!
//! - **Health checks**: every repository on a branch or tag, every shared
//!   submodule pinned to one commit.
//! - **Bottom-up pushes**: nested repositories are validated, then pushed
//!   children before parents.
//! - **Shared submodule sync**: one submodule checked out in many places is
//!   moved to a single target commit and the new pointers are committed all
//!   the way up.
//! - **Worktrees**: new worktrees get their submodules from the main
//!   worktree instead of the network.
//!
//! ## Example
//!
//! ```rust,no_run
//! use grove::core::{discover, topological_sort, DiscoveryOptions};
//!
//! let repos = discover(std::path::Path::new("."), &DiscoveryOptions::default());
//! for repo in topological_sort(repos).unwrap() {
//!     println!("{}", repo.rel_path());
//! }
//! ```

pub mod commands;
pub mod core;
pub mod error;
pub mod git;
pub mod logging;
pub mod subrepo;
pub mod utils;
pub mod worktree;
