//! Shared-submodule synchronization
//!
//! Brings every checkout of one sync group's submodule to a single target
//! commit, then records the new pointers bottom-up through every containing
//! repository and pushes the result.

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::locations::{ancestor_repos, discover_locations, SharedLocation};
use super::staleness::{check_staleness, Staleness};
use crate::core::config::{MAX_SHA_LENGTH, MIN_SHA_LENGTH, SHORT_SHA_LENGTH};
use crate::core::project::SyncGroup;
use crate::core::push::{push_pending, PushOutcome};
use crate::core::validator::{print_failures, status_table, validate_all, ValidateOptions};
use crate::core::workspace::Workspace;
use crate::error::{self, GroveError};
use crate::git::{self, GitRunner, Repository};
use crate::utils::Palette;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub no_push: bool,
    pub force: bool,
    pub verify: bool,
    /// Implies `verify`
    pub rebuild: bool,
}

/// Where the target commit came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitSource {
    Explicit,
    OriginMain(PathBuf),
    LocalMain(PathBuf),
}

impl fmt::Display for CommitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitSource::Explicit => f.write_str("explicit argument"),
            CommitSource::OriginMain(repo) => write!(f, "origin/main from {}", repo.display()),
            CommitSource::LocalMain(repo) => write!(f, "main from {}", repo.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCommit {
    pub sha: String,
    pub source: CommitSource,
}

impl TargetCommit {
    pub fn short(&self) -> &str {
        &self.sha[..self.sha.len().min(SHORT_SHA_LENGTH)]
    }
}

/// Accepts 7 to 40 lowercase hex digits
pub fn validate_commit_arg(commit: &str) -> error::Result<()> {
    let plausible = (MIN_SHA_LENGTH..=MAX_SHA_LENGTH).contains(&commit.len())
        && commit.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if plausible {
        Ok(())
    } else {
        Err(GroveError::InvalidCommit(commit.to_string()))
    }
}

/// Determines the commit every location should end up at.
///
/// An explicit commit is validated and used verbatim. Otherwise `main` of
/// the standalone repository is used, preferring `origin/main` when the
/// repository has a remote.
pub async fn resolve_target_commit(
    git: &dyn GitRunner,
    commit: Option<&str>,
    standalone: Option<&Path>,
    group: &str,
) -> error::Result<TargetCommit> {
    if let Some(commit) = commit {
        validate_commit_arg(commit)?;
        return Ok(TargetCommit {
            sha: commit.to_string(),
            source: CommitSource::Explicit,
        });
    }

    let repo = standalone.ok_or_else(|| GroveError::NoStandaloneRepo(group.to_string()))?;
    if !repo.exists() {
        return Err(GroveError::StandaloneRepoMissing(repo.to_path_buf()));
    }

    if git::has_origin(git, repo).await {
        git::operations::exec(git, repo, &["fetch", "origin", "main", "--quiet"]).await;
        if let Some(sha) = git::rev_parse(git, repo, "origin/main").await {
            return Ok(TargetCommit {
                sha,
                source: CommitSource::OriginMain(repo.to_path_buf()),
            });
        }
        debug!(repo = %repo.display(), "origin/main unavailable, trying local main");
    }

    match git::rev_parse(git, repo, "main").await {
        Some(sha) => Ok(TargetCommit {
            sha,
            source: CommitSource::LocalMain(repo.to_path_buf()),
        }),
        None => Err(GroveError::TargetUnresolved(repo.to_path_buf())),
    }
}

/// Pushes locations that sit on a branch ahead of `origin`.
///
/// Lets a local reference remote receive in-progress work before "latest"
/// is resolved. Returns how many were pushed (or would be).
pub async fn push_ahead_locations(
    git: &dyn GitRunner,
    locations: &[SharedLocation],
    root: &Path,
    dry_run: bool,
    palette: Palette,
) -> usize {
    let mut pushed = 0;

    for location in locations {
        let Some(branch) = git::current_branch(git, &location.path).await else {
            continue;
        };
        git::fetch_origin(git, &location.path).await;

        let ahead = match git::commits_ahead_of_origin(git, &location.path, &branch).await {
            Some(n) if n > 0 => n,
            _ => continue,
        };
        let rel = location.display_path(root);

        if dry_run {
            println!("  {} {rel} ({ahead} commits ahead)", palette.attention("Would push"));
            pushed += 1;
            continue;
        }
        match git::push_to_origin(git, &location.path, &branch).await {
            Ok(()) => {
                println!("  {} {rel} ({ahead} commits)", palette.good("Pushed"));
                pushed += 1;
            }
            Err(e) => {
                warn!(location = %rel, error = %e, "pre-push failed");
                println!("  {} {rel}", palette.bad("Failed to push"));
            }
        }
    }

    pushed
}

/// Stages `subpaths` in `repo` and commits them if anything is staged.
///
/// In a dry run the paths are known to be about to change, so a non-empty
/// list is reported as a commit.
async fn commit_submodule_changes(
    git: &dyn GitRunner,
    repo: &Repository,
    subpaths: &[String],
    message: &str,
    dry_run: bool,
    palette: Palette,
) -> Result<bool> {
    if subpaths.is_empty() {
        return Ok(false);
    }

    if dry_run {
        println!(
            "  {} in {}: {message}",
            palette.attention("Would commit"),
            repo.rel_path()
        );
        return Ok(true);
    }

    let mut has_changes = false;
    for subpath in subpaths {
        if git::path_has_changes(git, &repo.path, subpath).await {
            has_changes = true;
            break;
        }
    }
    if !has_changes {
        return Ok(false);
    }

    for subpath in subpaths {
        git::stage_path(git, &repo.path, subpath).await;
    }
    if !git::has_staged_changes(git, &repo.path).await {
        return Ok(false);
    }

    git::commit(git, &repo.path, message).await?;
    println!("  {} in {}: {message}", palette.good("Committed"), repo.rel_path());
    Ok(true)
}

/// What one sync run did
#[derive(Debug, Default)]
pub struct SyncReport {
    pub group: String,
    pub target: Option<TargetCommit>,
    pub locations: Vec<SharedLocation>,
    /// Locations that were not at the target
    pub to_update: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub failed_updates: Vec<PathBuf>,
    pub committed: Vec<PathBuf>,
    pub failed_commits: Vec<PathBuf>,
    pub push: PushOutcome,
    pub staleness: Vec<(PathBuf, Staleness)>,
    pub exit_code: i32,
}

impl SyncReport {
    fn finish(mut self) -> Self {
        let failed = !self.failed_updates.is_empty()
            || !self.failed_commits.is_empty()
            || !self.push.failed.is_empty();
        if failed {
            self.exit_code = 1;
        }
        self
    }
}

/// Paths of nested repositories below `repo` whose pointer changed
async fn changed_nested_submodules(git: &dyn GitRunner, repo: &Repository) -> Vec<String> {
    git::changed_paths(git, &repo.path)
        .await
        .into_iter()
        .filter(|p| repo.path.join(p).join(".git").exists())
        .collect()
}

/// Nearest repository in `ancestors` strictly containing `path`
fn nearest_container<'a>(path: &Path, ancestors: &'a [Repository]) -> Option<&'a Repository> {
    ancestors
        .iter()
        .filter(|r| r.path != path && path.starts_with(&r.path))
        .max_by_key(|r| r.path.components().count())
}

/// Synchronizes every location of `group` to one commit
pub async fn sync_group(
    ws: &Workspace,
    group: &SyncGroup,
    commit: Option<&str>,
    mut options: SyncOptions,
) -> Result<SyncReport> {
    if options.rebuild {
        options.verify = true;
    }
    let git = ws.git();
    let palette = ws.palette;
    let root = ws.root.as_path();
    let mut report = SyncReport {
        group: group.name.clone(),
        ..SyncReport::default()
    };

    // Malformed input fails before anything touches a repository
    if let Some(commit) = commit {
        validate_commit_arg(commit)?;
    }

    println!("{}", palette.bold(format!("Checking for ahead {} submodules...", group.name)));
    let early = discover_locations(git, root, &group.url_match).await?;
    if push_ahead_locations(git, &early, root, options.dry_run, palette).await > 0 {
        println!();
    }

    println!("{}", palette.bold("Resolving target commit..."));
    let target = resolve_target_commit(git, commit, group.standalone_repo.as_deref(), &group.name).await?;
    println!("Target: {} ({})", palette.good(target.short()), target.source);
    println!();

    println!("{}", palette.bold(format!("Discovering {} submodule locations...", group.name)));
    report.locations = discover_locations(git, root, &group.url_match).await?;
    if report.locations.is_empty() {
        println!("{}", palette.bad(format!("Error: No {} submodules found", group.name)));
        report.target = Some(target);
        report.exit_code = 1;
        return Ok(report);
    }

    println!(
        "Found {} {} submodule locations:",
        palette.good(report.locations.len()),
        group.name
    );
    for location in &report.locations {
        let rel = location.display_path(root);
        if location.is_at(&target.sha) {
            println!("  {} {rel} (already at {})", palette.good("✓"), location.short_commit());
        } else {
            println!(
                "  {} {rel} ({} → {})",
                palette.attention("→"),
                location.short_commit(),
                target.short()
            );
        }
    }
    println!();

    let to_update: Vec<SharedLocation> = report
        .locations
        .iter()
        .filter(|l| !l.is_at(&target.sha))
        .cloned()
        .collect();
    report.to_update = to_update.iter().map(|l| l.path.clone()).collect();
    report.target = Some(target.clone());

    if to_update.is_empty() {
        println!(
            "{}",
            palette.good(format!(
                "All {} submodules already at target commit. Nothing to do.",
                group.name
            ))
        );
        return Ok(report);
    }

    // Every repository that will receive a pointer commit must itself be current
    println!("{}", palette.bold("Validating parent repositories..."));
    let mut ancestors = ancestor_repos(&to_update, root);
    println!("  Fetching from remotes...");
    for repo in &ancestors {
        git::fetch_all(git, &repo.path).await;
    }
    let failed = validate_all(&mut ancestors, git, ValidateOptions::in_sync()).await;
    print_failures(&ancestors, &failed, palette);
    print!("{}", status_table(&ancestors, true, palette));
    println!();

    if !failed.is_empty() {
        if !options.force {
            println!(
                "{}",
                palette.bad("Validation failed. Fix the issues above or use --force to skip.")
            );
            println!();
            println!("{}", palette.bold("Common fixes:"));
            println!("  - Pull latest: cd <repo> && git pull");
            println!("  - Checkout branch: cd <repo> && git checkout main");
            report.exit_code = 1;
            return Ok(report);
        }
        println!(
            "{}",
            palette.attention("Warning: Proceeding despite validation failures (--force)")
        );
        println!();
    }

    if options.dry_run {
        println!("{}", palette.attention("Dry run mode - previewing changes:"));
        println!();
    }

    println!("{}", palette.bold(format!("Updating {} submodules...", group.name)));
    let mut updated: Vec<&SharedLocation> = Vec::new();
    for location in &to_update {
        let rel = location.display_path(root);
        if options.dry_run {
            println!("  {} {rel}", palette.attention("Would update"));
            updated.push(location);
            continue;
        }

        git::fetch_all(git, &location.path).await;
        match git::checkout(git, &location.path, &target.sha).await {
            Ok(()) => {
                println!("  {} {rel}", palette.good("Updated"));
                updated.push(location);
            }
            Err(e) => {
                warn!(location = %rel, error = %e, "checkout failed");
                println!("  {} {rel}", palette.bad("Failed to update"));
                report.failed_updates.push(location.path.clone());
            }
        }
    }
    println!();
    report.updated = updated.iter().map(|l| l.path.clone()).collect();

    if updated.is_empty() {
        println!("{}", palette.attention("No submodules were updated."));
        return Ok(report.finish());
    }

    println!("{}", palette.bold("Committing changes bottom-up..."));
    let mut direct: BTreeMap<&Path, BTreeSet<String>> = BTreeMap::new();
    for location in &updated {
        direct
            .entry(location.parent_repo.as_path())
            .or_default()
            .insert(location.rel_path.clone());
    }

    let mut committed_children: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
    for repo in &ancestors {
        let mut subpaths: BTreeSet<String> = direct.get(repo.path.as_path()).cloned().unwrap_or_default();
        if let Some(children) = committed_children.get(&repo.path) {
            subpaths.extend(children.iter().cloned());
        }
        // Repositories holding a location stage only what this sync moved
        if !options.dry_run && !direct.contains_key(repo.path.as_path()) {
            subpaths.extend(changed_nested_submodules(git, repo).await);
        }
        let subpaths: Vec<String> = subpaths.into_iter().collect();

        match commit_submodule_changes(git, repo, &subpaths, &group.commit_message, options.dry_run, palette).await {
            Ok(true) => {
                report.committed.push(repo.path.clone());
                if let Some(parent) = nearest_container(&repo.path, &ancestors) {
                    if let Ok(rel) = repo.path.strip_prefix(&parent.path) {
                        committed_children
                            .entry(parent.path.clone())
                            .or_default()
                            .insert(rel.display().to_string());
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(repo = %repo.rel_path(), error = %e, "commit failed");
                println!("  {} in {}", palette.bad("Failed to commit"), repo.rel_path());
                report.failed_commits.push(repo.path.clone());
            }
        }
    }
    println!();

    if options.no_push {
        println!("{}", palette.attention("Skipping push (--no-push specified)"));
        println!();
        println!("{}", palette.bold("Next steps:"));
        println!("  1. Verify: grove check");
        println!("  2. Push:   grove push");
    } else if report.committed.is_empty() && !options.dry_run {
        println!("{}", palette.good("No commits made - nothing to push."));
    } else {
        report.push = push_pending(ws, ancestors.clone(), options.dry_run).await?;
        if report.push.pushed.is_empty() && report.push.failed.is_empty() {
            println!("{}", palette.good("All repositories up-to-date. Nothing to push."));
        }
        println!();
    }

    if options.verify && !options.dry_run {
        verify_locations(&mut report, group, root, options.rebuild, palette).await;
    }

    let report = report.finish();
    print_summary(&report, options, palette);
    Ok(report)
}

async fn verify_locations(
    report: &mut SyncReport,
    group: &SyncGroup,
    root: &Path,
    rebuild: bool,
    palette: Palette,
) {
    println!("{}", palette.bold("Verifying generated files..."));
    let mut any_stale = false;

    for location in &report.locations {
        let outcome = check_staleness(
            &location.path,
            group.staleness_check.as_deref(),
            &group.fix_flag,
            rebuild,
        )
        .await;
        let rel = location.display_path(root);
        match &outcome {
            Staleness::Stale => {
                any_stale = true;
                println!("  {} {rel}: {outcome}", palette.attention("⚠"));
            }
            Staleness::UpToDate => println!("  {} {rel}: {outcome}", palette.good("✓")),
            _ => println!("  {} {rel}: {outcome}", palette.attention("✓")),
        }
        report.staleness.push((location.path.clone(), outcome));
    }
    println!();

    if any_stale {
        println!(
            "{}",
            palette.attention(format!(
                "Warning: Some {} locations have stale generated files.",
                group.name
            ))
        );
        println!();
        println!("{}", palette.bold("To fix:"));
        println!("  1. cd to each stale location and regenerate the files");
        println!("  2. Commit and push the regenerated files");
        println!();
        println!("Or run: grove sync {} --rebuild", group.name);
        println!();
    }
}

fn print_summary(report: &SyncReport, options: SyncOptions, palette: Palette) {
    let target = report.target.as_ref().map(TargetCommit::short).unwrap_or("unknown");

    if options.dry_run {
        println!("{}", palette.attention("Dry run complete."));
        println!();
        println!("{}", palette.bold("Summary:"));
        println!("  Target commit: {target}");
        println!("  Submodules to update: {}", report.updated.len());
        println!("  Commits to make: {}", report.committed.len());
        println!("  Repos to push: {}", report.push.pushed.len());
    } else if report.exit_code != 0 {
        println!("{}", palette.bad(format!("Sync of {} finished with failures.", report.group)));
        println!();
        println!("{}", palette.bold("Troubleshooting:"));
        if !report.failed_updates.is_empty() {
            println!("  - Fetch and check out manually: cd <location> && git fetch --all && git checkout {target}");
        }
        println!("  - Check remote connectivity: git remote -v");
        println!("  - Try pushing manually: grove push");
    } else {
        println!("{}", palette.good(format!("{} sync complete!", report.group)));
        println!();
        println!("{}", palette.bold("Summary:"));
        println!("  Target commit: {target}");
        println!("  Submodules updated: {}", report.updated.len());
        println!("  Repos pushed: {}", report.push.pushed.len());
    }
}
