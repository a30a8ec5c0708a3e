//! Bottom-up push workflow
//!
//! Validation gates the whole batch; pushes then run children-first and a
//! failing push never stops the ones after it.

use anyhow::Result;
use std::path::PathBuf;

use super::graph::topological_sort;
use super::validator::{print_failures, status_table, validate, validate_all, ValidateOptions};
use super::workspace::Workspace;
use crate::git::{self, RepoStatus, Repository, Tracking};

#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    pub dry_run: bool,
    pub force: bool,
}

/// Result of pushing a batch
#[derive(Debug, Default)]
pub struct PushOutcome {
    pub pushed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct PushReport {
    /// Every repository with its validation verdict
    pub repos: Vec<Repository>,
    pub validation_failures: usize,
    /// Validation failed and `force` was not given
    pub aborted: bool,
    pub outcome: PushOutcome,
    pub exit_code: i32,
}

fn describe_push(repo: &Repository, branch: &str) -> String {
    match repo.tracking {
        Some(Tracking::NewBranch) => format!("(new branch: {branch})"),
        _ => format!("({} commits on {branch})", repo.ahead()),
    }
}

/// Pushes `repos` children-first.
///
/// Repositories without a branch are skipped. In a dry run nothing is
/// pushed and every repository counts as pushed.
pub async fn push_in_order(ws: &Workspace, repos: Vec<Repository>, dry_run: bool) -> Result<PushOutcome> {
    let palette = ws.palette;
    let mut outcome = PushOutcome::default();

    for repo in topological_sort(repos)? {
        let Some(branch) = repo.branch.as_deref() else {
            continue;
        };
        let detail = describe_push(&repo, branch);
        println!("  {} {} {}", palette.bold("Pushing"), repo.rel_path(), palette.dim(&detail));

        if dry_run {
            outcome.pushed.push(repo.path.clone());
            continue;
        }

        match git::push_branch(ws.git(), &repo.path, branch).await {
            Ok(()) => outcome.pushed.push(repo.path.clone()),
            Err(e) => {
                tracing::warn!(repo = %repo.rel_path(), error = %e, "push failed");
                println!("  {} {}", palette.bad("✗ Failed to push"), repo.rel_path());
                outcome.failed.push(repo.path.clone());
            }
        }
    }

    Ok(outcome)
}

/// Re-validates `repos` and pushes the ones with unpushed commits
pub async fn push_pending(ws: &Workspace, mut repos: Vec<Repository>, dry_run: bool) -> Result<PushOutcome> {
    let mut pending = Vec::new();
    for mut repo in repos.drain(..) {
        if validate(&mut repo, ws.git(), ValidateOptions::default()).await
            && repo.status == RepoStatus::Pending
        {
            pending.push(repo);
        }
    }

    if pending.is_empty() {
        return Ok(PushOutcome::default());
    }
    push_in_order(ws, pending, dry_run).await
}

/// Validates `repos` and pushes every pending one, bottom-up
pub async fn push_repositories(
    ws: &Workspace,
    mut repos: Vec<Repository>,
    options: PushOptions,
) -> Result<PushReport> {
    let palette = ws.palette;

    println!("{}", palette.bold("Validating repositories..."));
    println!();
    let failed = validate_all(&mut repos, ws.git(), ValidateOptions::tolerant()).await;
    print_failures(&repos, &failed, palette);
    print!("{}", status_table(&repos, false, palette));
    println!();

    let mut report = PushReport {
        repos,
        validation_failures: failed.len(),
        aborted: false,
        outcome: PushOutcome::default(),
        exit_code: 0,
    };

    if !failed.is_empty() {
        if !options.force {
            println!(
                "{}",
                palette.bad("Validation failed. Fix the issues above or use --force to skip validation.")
            );
            report.aborted = true;
            report.exit_code = 1;
            return Ok(report);
        }
        println!(
            "{}",
            palette.attention("Warning: Proceeding despite validation failures (--force)")
        );
        println!();
    }

    let pending: Vec<Repository> = report
        .repos
        .iter()
        .filter(|r| r.status == RepoStatus::Pending)
        .cloned()
        .collect();

    if pending.is_empty() {
        println!("{}", palette.good("All repositories are up-to-date. Nothing to push."));
        return Ok(report);
    }

    println!(
        "{}",
        palette.bold(format!("Pushing {} repositories (bottom-up)...", pending.len()))
    );
    if options.dry_run {
        println!("{}", palette.attention("(dry-run mode - no actual pushes)"));
    }
    println!();

    report.outcome = push_in_order(ws, pending, options.dry_run).await?;
    println!();

    if options.dry_run {
        println!(
            "{} Would push {} repositories.",
            palette.attention("Dry run complete."),
            report.outcome.pushed.len()
        );
    } else if !report.outcome.failed.is_empty() {
        println!("{}", palette.bad("Some pushes failed."));
        println!();
        println!("{}", palette.bold("Troubleshooting:"));
        println!("  - Check remote connectivity: git remote -v");
        println!("  - Try pushing manually: cd <repo> && git push -v");
        report.exit_code = 1;
    } else {
        println!(
            "{}",
            palette.good(format!("Successfully pushed {} repositories.", report.outcome.pushed.len()))
        );
    }

    Ok(report)
}
