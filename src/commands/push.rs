//! `grove push`

use anyhow::Result;

use super::{scan, title, NO_REPOS_MESSAGE};
use crate::core::{push_repositories, PushOptions, Workspace};

/// Pushes every repository with unpushed commits, children first
pub async fn handle_push_command(ws: &Workspace, options: PushOptions) -> Result<i32> {
    title(ws, "🚀 grove push");

    let repos = scan(ws);
    if repos.is_empty() {
        println!("{NO_REPOS_MESSAGE}");
        return Ok(0);
    }

    let report = push_repositories(ws, repos, options).await?;
    title(ws, "✅ grove push");
    Ok(report.exit_code)
}
