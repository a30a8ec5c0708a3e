//! `grove check`: repository health and sync-group consistency
//!
//! A repository is healthy when it sits on a tag or a branch. A sync group
//! is consistent when all of its locations point at one commit.

use anyhow::Result;
use std::fmt;

use super::{scan, title};
use crate::core::Workspace;
use crate::git::{self, GitRunner, Repository};
use crate::subrepo::{discover_locations, GroupDrift};
use crate::utils::Palette;

/// Where a repository's HEAD is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Tag(String),
    Branch(String),
    Detached,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Tag(tag) => f.write_str(tag),
            Position::Branch(branch) => f.write_str(branch),
            Position::Detached => f.write_str("detached HEAD"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepoHealth {
    pub rel_path: String,
    pub position: Position,
    pub short_sha: Option<String>,
}

impl RepoHealth {
    pub fn is_healthy(&self) -> bool {
        self.position != Position::Detached
    }

    fn sha(&self) -> &str {
        self.short_sha.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug)]
pub struct CheckReport {
    pub repos: Vec<RepoHealth>,
    pub groups: Vec<GroupDrift>,
}

impl CheckReport {
    pub fn is_healthy(&self) -> bool {
        self.repos.iter().all(RepoHealth::is_healthy) && self.groups.iter().all(|g| !g.has_drift)
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_healthy() {
            0
        } else {
            1
        }
    }
}

/// Exact tag first, then branch, otherwise detached
pub async fn inspect(git: &dyn GitRunner, repo: &Repository) -> RepoHealth {
    let position = match git::exact_tag(git, &repo.path).await {
        Some(tag) => Position::Tag(tag),
        None => match git::current_branch(git, &repo.path).await {
            Some(branch) => Position::Branch(branch),
            None => Position::Detached,
        },
    };
    RepoHealth {
        rel_path: repo.rel_path().to_string(),
        position,
        short_sha: git::head_commit(git, &repo.path, true).await,
    }
}

fn print_repo(health: &RepoHealth, verbose: bool, palette: Palette) {
    if health.is_healthy() {
        let sha = if verbose {
            format!(" ({})", health.sha())
        } else {
            String::new()
        };
        println!(
            "{} {} is on: {}{}",
            palette.good("✓"),
            health.rel_path,
            health.position,
            palette.dim(sha)
        );
    } else {
        println!(
            "{} {} is in detached HEAD state ({})",
            palette.attention("⚠"),
            health.rel_path,
            health.sha()
        );
    }
}

fn print_group(drift: &GroupDrift, ws: &Workspace, verbose: bool) {
    let palette = ws.palette;
    let count = drift.locations.len();

    if !drift.has_drift {
        let at = drift
            .locations
            .first()
            .map(|l| format!(" at {}", l.short_commit()))
            .unwrap_or_default();
        println!(
            "{} {}: {count} location(s) in sync{at}",
            palette.good("✓"),
            drift.group
        );
        if verbose {
            for location in &drift.locations {
                println!("    {}", location.display_path(&ws.root));
            }
        }
        return;
    }

    println!(
        "{} {}: {count} locations at {} different commits (sync score {:.0}%)",
        palette.attention("⚠"),
        drift.group,
        drift.unique_commits,
        drift.sync_score
    );
    for (commit, locations) in GroupDrift::by_commit(&drift.locations) {
        let short = &commit[..commit.len().min(crate::core::config::SHORT_SHA_LENGTH)];
        println!("    {}:", palette.bold(short));
        for location in locations {
            println!("      {}", location.display_path(&ws.root));
        }
    }
}

/// Inspects every repository and every sync group, printing as it goes
pub async fn check_workspace(ws: &Workspace, verbose: bool) -> Result<CheckReport> {
    let palette = ws.palette;
    let git = ws.git();

    println!("{}", palette.bold("Checking submodule health..."));
    println!();

    let mut repos = Vec::new();
    for repo in scan(ws) {
        let health = inspect(git, &repo).await;
        print_repo(&health, verbose, palette);
        repos.push(health);
    }

    println!();
    println!("{}", palette.bold("Sync groups:"));
    let mut groups = Vec::new();
    for group in &ws.settings.sync_groups {
        let locations = discover_locations(git, &ws.root, &group.url_match).await?;
        let drift = GroupDrift::new(group.name.clone(), locations);
        print_group(&drift, ws, verbose);
        groups.push(drift);
    }

    let report = CheckReport { repos, groups };

    if report.repos.iter().any(|r| !r.is_healthy()) {
        println!();
        println!("{}", palette.bold("To fix detached HEAD state:"));
        println!("  cd <repository>");
        println!("  git checkout <branch-or-tag>");
        println!("  then commit the updated submodule reference in its parent");
    }
    for drift in report.groups.iter().filter(|g| g.has_drift) {
        println!();
        println!("{}", palette.bold(format!("To bring {} back in sync:", drift.group)));
        println!("  grove sync {}", drift.group);
    }
    if report.is_healthy() {
        println!();
        println!("{}", palette.good("All repositories healthy and sync groups consistent."));
    }

    Ok(report)
}

pub async fn handle_check_command(ws: &Workspace, verbose: bool) -> Result<i32> {
    title(ws, "🔍 grove check");
    let report = check_workspace(ws, verbose).await?;
    title(ws, "✅ grove check");
    Ok(report.exit_code())
}
