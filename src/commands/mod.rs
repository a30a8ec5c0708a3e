//! CLI-facing command handlers
//!
//! Each handler prints its report and returns the process exit code.

pub mod check;
pub mod push;
pub mod sync;
pub mod worktree;

use crate::core::{discover, DiscoveryOptions, Workspace};
use crate::git::Repository;
use crate::utils::{set_terminal_title, spinner};

const SCANNING_MESSAGE: &str = "Scanning for repositories...";
pub(crate) const NO_REPOS_MESSAGE: &str = "No git repositories found under the project root.";

/// Discovers the workspace's repositories, shared submodules excluded
pub(crate) fn scan(ws: &Workspace) -> Vec<Repository> {
    let pb = spinner(ws.palette, SCANNING_MESSAGE);
    let options = DiscoveryOptions::new(&ws.settings.exclude_names, true);
    let repos = discover(&ws.root, &options);
    pb.finish_and_clear();
    repos
}

/// Terminal title updates only make sense on an interactive terminal
pub(crate) fn title(ws: &Workspace, text: &str) {
    if ws.palette.enabled {
        set_terminal_title(text);
    }
}
