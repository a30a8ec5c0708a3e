//! Primitive git queries and mutations
//!
//! Thin wrappers over [`GitRunner`] that turn exit codes and line-oriented
//! output into typed answers. None of these functions decide policy; the
//! validator and the workflows do.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use super::repository::Tracking;
use super::runner::{GitOutput, GitRunner};

// Git command arguments
const GIT_DIFF_QUIET_ARGS: &[&str] = &["diff", "--quiet"];
const GIT_DIFF_CACHED_ARGS: &[&str] = &["diff", "--cached", "--quiet"];
const GIT_DIFF_NAME_ONLY_ARGS: &[&str] = &["diff", "--name-only"];
const GIT_BRANCH_SHOW_CURRENT_ARGS: &[&str] = &["branch", "--show-current"];
const GIT_REMOTE_ORIGIN_ARGS: &[&str] = &["remote", "get-url", "origin"];
const GIT_UPSTREAM_ARGS: &[&str] = &["rev-parse", "--abbrev-ref", "@{upstream}"];
const GIT_UPSTREAM_COUNT_ARGS: &[&str] = &["rev-list", "--count", "--left-right", "@{upstream}...HEAD"];
const GIT_DESCRIBE_TAG_ARGS: &[&str] = &["describe", "--exact-match", "--tags"];
const GIT_FETCH_ALL_ARGS: &[&str] = &["fetch", "--all", "--quiet"];
const GIT_FETCH_ORIGIN_ARGS: &[&str] = &["fetch", "origin", "--quiet"];
const GIT_PUSH_ARGS: &[&str] = &["push"];

/// Runs a git command, folding spawn errors into a failed output
pub(crate) async fn exec(git: &dyn GitRunner, path: &Path, args: &[&str]) -> GitOutput {
    match git.run(path, args).await {
        Ok(output) => output,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "git invocation could not run");
            GitOutput::failed(e.to_string())
        }
    }
}

/// Runs a git command that must succeed, returning its stdout
pub(crate) async fn exec_checked(git: &dyn GitRunner, path: &Path, args: &[&str]) -> Result<String> {
    let output = exec(git, path, args).await;
    if output.success {
        Ok(output.stdout)
    } else {
        Err(crate::error::GroveError::Git {
            path: path.to_path_buf(),
            args: args.join(" "),
            stderr: output.stderr,
        }
        .into())
    }
}

/// Checks for modified tracked files or staged changes
pub async fn has_uncommitted_changes(git: &dyn GitRunner, path: &Path) -> bool {
    let unstaged = exec(git, path, GIT_DIFF_QUIET_ARGS).await;
    if !unstaged.success {
        return true;
    }
    !exec(git, path, GIT_DIFF_CACHED_ARGS).await.success
}

/// Current branch name, or None when HEAD is detached
pub async fn current_branch(git: &dyn GitRunner, path: &Path) -> Option<String> {
    let output = exec(git, path, GIT_BRANCH_SHOW_CURRENT_ARGS).await;
    let branch = output.stdout.trim();
    if output.success && !branch.is_empty() {
        Some(branch.to_string())
    } else {
        None
    }
}

/// Whether an `origin` remote is configured
pub async fn has_origin(git: &dyn GitRunner, path: &Path) -> bool {
    exec(git, path, GIT_REMOTE_ORIGIN_ARGS).await.success
}

/// Parses `rev-list --count --left-right A...HEAD` output into (ahead, behind)
fn parse_left_right(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let behind = parts.next()?.parse().ok()?;
    let ahead = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((ahead, behind))
}

async fn count_against(git: &dyn GitRunner, path: &Path, args: &[&str]) -> Tracking {
    let output = exec(git, path, args).await;
    let (ahead, behind) = if output.success {
        parse_left_right(&output.stdout).unwrap_or((0, 0))
    } else {
        (0, 0)
    };
    Tracking::Remote { ahead, behind }
}

/// Commits ahead/behind the remote for `branch`.
///
/// Compares against the configured upstream when there is one, otherwise
/// against `origin/<branch>` if that branch exists on the remote. A branch
/// the remote has never seen is reported as [`Tracking::NewBranch`].
pub async fn ahead_behind(git: &dyn GitRunner, path: &Path, branch: &str) -> Tracking {
    if exec(git, path, GIT_UPSTREAM_ARGS).await.success {
        return count_against(git, path, GIT_UPSTREAM_COUNT_ARGS).await;
    }

    let heads = exec(git, path, &["ls-remote", "--heads", "origin", branch]).await;
    let wanted = format!("refs/heads/{branch}");
    let exists = heads.success
        && heads
            .stdout
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(wanted.as_str()));
    if exists {
        let range = format!("origin/{branch}...HEAD");
        return count_against(git, path, &["rev-list", "--count", "--left-right", &range]).await;
    }

    Tracking::NewBranch
}

/// Commits on HEAD that `origin/<branch>` does not have
pub async fn commits_ahead_of_origin(git: &dyn GitRunner, path: &Path, branch: &str) -> Option<u32> {
    let range = format!("origin/{branch}..HEAD");
    let output = exec(git, path, &["rev-list", "--count", &range]).await;
    if output.success {
        output.stdout.trim().parse().ok()
    } else {
        None
    }
}

/// Resolves a revision to its SHA
pub async fn rev_parse(git: &dyn GitRunner, path: &Path, rev: &str) -> Option<String> {
    let output = exec(git, path, &["rev-parse", rev]).await;
    let sha = output.stdout.trim();
    if output.success && !sha.is_empty() {
        Some(sha.to_string())
    } else {
        None
    }
}

/// SHA of HEAD, abbreviated when `short`
pub async fn head_commit(git: &dyn GitRunner, path: &Path, short: bool) -> Option<String> {
    let args: &[&str] = if short {
        &["rev-parse", "--short", "HEAD"]
    } else {
        &["rev-parse", "HEAD"]
    };
    let output = exec(git, path, args).await;
    if output.success && !output.stdout.is_empty() {
        Some(output.stdout)
    } else {
        None
    }
}

/// Tag pointing exactly at HEAD, if any
pub async fn exact_tag(git: &dyn GitRunner, path: &Path) -> Option<String> {
    let output = exec(git, path, GIT_DESCRIBE_TAG_ARGS).await;
    if output.success && !output.stdout.is_empty() {
        Some(output.stdout)
    } else {
        None
    }
}

/// Fetches every remote
pub async fn fetch_all(git: &dyn GitRunner, path: &Path) -> bool {
    exec(git, path, GIT_FETCH_ALL_ARGS).await.success
}

/// Fetches `origin` only
pub async fn fetch_origin(git: &dyn GitRunner, path: &Path) -> bool {
    exec(git, path, GIT_FETCH_ORIGIN_ARGS).await.success
}

/// Checks out a branch, tag or commit
pub async fn checkout(git: &dyn GitRunner, path: &Path, what: &str) -> Result<()> {
    exec_checked(git, path, &["checkout", what, "--quiet"]).await?;
    Ok(())
}

/// Pushes the current branch.
///
/// A plain `git push` is tried first; when that fails (typically because no
/// upstream is configured yet) the push is retried with
/// `--set-upstream origin <branch>`.
pub async fn push_branch(git: &dyn GitRunner, path: &Path, branch: &str) -> Result<()> {
    if exec(git, path, GIT_PUSH_ARGS).await.success {
        return Ok(());
    }
    debug!(path = %path.display(), branch, "plain push failed, retrying with upstream");
    exec_checked(git, path, &["push", "-u", "origin", branch]).await?;
    Ok(())
}

/// Pushes `branch` explicitly to `origin`
pub async fn push_to_origin(git: &dyn GitRunner, path: &Path, branch: &str) -> Result<()> {
    exec_checked(git, path, &["push", "origin", branch]).await?;
    Ok(())
}

/// Whether `subpath` differs between the index and the working tree
pub async fn path_has_changes(git: &dyn GitRunner, path: &Path, subpath: &str) -> bool {
    !exec(git, path, &["diff", "--quiet", "--", subpath]).await.success
}

/// Paths with unstaged changes
pub async fn changed_paths(git: &dyn GitRunner, path: &Path) -> Vec<String> {
    let output = exec(git, path, GIT_DIFF_NAME_ONLY_ARGS).await;
    if !output.success {
        return Vec::new();
    }
    output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stages a single path
pub async fn stage_path(git: &dyn GitRunner, path: &Path, subpath: &str) -> bool {
    exec(git, path, &["add", "--", subpath]).await.success
}

/// Checks if repository has staged changes ready to commit
pub async fn has_staged_changes(git: &dyn GitRunner, path: &Path) -> bool {
    // Command succeeds when NO changes (exit 0), so invert
    !exec(git, path, GIT_DIFF_CACHED_ARGS).await.success
}

/// Commits whatever is staged
pub async fn commit(git: &dyn GitRunner, path: &Path, message: &str) -> Result<()> {
    exec_checked(git, path, &["commit", "-m", message]).await?;
    Ok(())
}

/// Reads a config value from the repository's local config
pub async fn get_local_config(git: &dyn GitRunner, path: &Path, key: &str) -> Option<String> {
    let output = exec(git, path, &["config", "--local", "--get", key]).await;
    if output.success && !output.stdout.is_empty() {
        Some(output.stdout)
    } else {
        None
    }
}

/// Sets a config value in the repository's local config
pub async fn set_local_config(git: &dyn GitRunner, path: &Path, key: &str, value: &str) -> bool {
    exec(git, path, &["config", "--local", key, value]).await.success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGit;

    #[test]
    fn test_parse_left_right() {
        assert_eq!(parse_left_right("2\t5"), Some((5, 2)));
        assert_eq!(parse_left_right("0 0"), Some((0, 0)));
        assert_eq!(parse_left_right(""), None);
        assert_eq!(parse_left_right("1"), None);
        assert_eq!(parse_left_right("x y"), None);
    }

    #[tokio::test]
    async fn test_uncommitted_from_unstaged_or_staged() {
        let path = Path::new("/w");

        let clean = FakeGit::new();
        assert!(!has_uncommitted_changes(&clean, path).await);

        let unstaged = FakeGit::new().fail("diff --quiet");
        assert!(has_uncommitted_changes(&unstaged, path).await);

        let staged = FakeGit::new().fail("diff --cached --quiet");
        assert!(has_uncommitted_changes(&staged, path).await);
    }

    #[tokio::test]
    async fn test_current_branch_empty_means_detached() {
        let path = Path::new("/w");
        let on_branch = FakeGit::new().ok("branch --show-current", "main");
        assert_eq!(current_branch(&on_branch, path).await.as_deref(), Some("main"));

        let detached = FakeGit::new().ok("branch --show-current", "");
        assert_eq!(current_branch(&detached, path).await, None);
    }

    #[tokio::test]
    async fn test_ahead_behind_prefers_upstream() {
        let git = FakeGit::new()
            .ok("rev-parse --abbrev-ref @{upstream}", "origin/main")
            .ok("rev-list --count --left-right @{upstream}...HEAD", "1\t3");
        let tracking = ahead_behind(&git, Path::new("/w"), "main").await;
        assert_eq!(tracking, Tracking::Remote { ahead: 3, behind: 1 });
        assert!(!git.called("ls-remote"));
    }

    #[tokio::test]
    async fn test_ahead_behind_falls_back_to_remote_branch() {
        let git = FakeGit::new()
            .fail("rev-parse --abbrev-ref @{upstream}")
            .ok(
                "ls-remote --heads origin feature",
                "abc123\trefs/heads/feature",
            )
            .ok("rev-list --count --left-right origin/feature...HEAD", "0\t2");
        let tracking = ahead_behind(&git, Path::new("/w"), "feature").await;
        assert_eq!(tracking, Tracking::Remote { ahead: 2, behind: 0 });
    }

    #[tokio::test]
    async fn test_ahead_behind_new_branch() {
        let git = FakeGit::new()
            .fail("rev-parse --abbrev-ref @{upstream}")
            .ok(
                "ls-remote --heads origin feature",
                "abc123\trefs/heads/feature-two",
            );
        let tracking = ahead_behind(&git, Path::new("/w"), "feature").await;
        assert_eq!(tracking, Tracking::NewBranch);
    }

    #[tokio::test]
    async fn test_push_retries_with_upstream() {
        let git = FakeGit::new().fail("push");
        push_branch(&git, Path::new("/w"), "topic").await.unwrap();
        assert!(git.called("push -u origin topic"));

        let failing = FakeGit::new().fail("push").fail("push -u origin topic");
        assert!(push_branch(&failing, Path::new("/w"), "topic").await.is_err());
    }

    #[tokio::test]
    async fn test_changed_paths_skips_blank_lines() {
        let git = FakeGit::new().ok("diff --name-only", "docs\n\ncommon\n");
        let paths = changed_paths(&git, Path::new("/w")).await;
        assert_eq!(paths, vec!["docs".to_string(), "common".to_string()]);
    }
}
