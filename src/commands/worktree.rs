//! `grove worktree add|remove`

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::Workspace;
use crate::worktree::{add_worktree, remove_worktree, AddOptions};

fn absolute(path: &Path) -> Result<std::path::PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid worktree path {}", path.display()))
}

pub async fn handle_worktree_add(
    ws: &Workspace,
    branch: &str,
    path: &Path,
    options: AddOptions,
) -> Result<i32> {
    let path = absolute(path)?;
    add_worktree(ws, branch, &path, options).await
}

pub async fn handle_worktree_remove(ws: &Workspace, path: &Path, force: bool) -> Result<i32> {
    let path = absolute(path)?;
    remove_worktree(ws, &path, force).await
}
