//! Repository validation state machine
//!
//! `validate` classifies a repository into a [`RepoStatus`] and answers
//! whether the operation the caller has in mind may proceed. Checks run in
//! a fixed order and the first failing one decides the outcome.

use tracing::debug;

use super::config::{NARROW_PATH_WIDTH, WIDE_PATH_WIDTH};
use crate::git::{self, GitRunner, RepoStatus, Repository};
use crate::utils::{shorten_path, Palette};

/// Which conditions count as failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Fail when the remote has commits the branch lacks
    pub check_sync: bool,
    /// Pinned submodules are legitimately detached
    pub allow_detached: bool,
    /// Some layouts keep repositories without a remote
    pub allow_no_remote: bool,
}

impl ValidateOptions {
    /// Options for a push run: pinned or local-only repositories are tolerated
    pub fn tolerant() -> Self {
        Self {
            allow_detached: true,
            allow_no_remote: true,
            ..Self::default()
        }
    }

    /// Options for repositories that are about to receive new commits
    pub fn in_sync() -> Self {
        Self {
            check_sync: true,
            ..Self::default()
        }
    }
}

/// Validates `repo`, recording status, branch, counts and message on it.
///
/// Returns whether the repository is acceptable under `options`. A tolerated
/// detached or remote-less repository returns `true` but keeps its failing
/// status so callers never treat it as pushable.
pub async fn validate(repo: &mut Repository, git: &dyn GitRunner, options: ValidateOptions) -> bool {
    repo.reset_validation();
    let path = repo.path.clone();
    let rel = repo.rel_path().to_string();

    if git::has_uncommitted_changes(git, &path).await {
        debug!(repo = %rel, "uncommitted changes");
        return repo.fail(
            RepoStatus::Uncommitted,
            format!("Has uncommitted changes. Run: cd {rel} && git status"),
        );
    }

    repo.branch = git::current_branch(git, &path).await;
    let Some(branch) = repo.branch.clone() else {
        debug!(repo = %rel, "detached HEAD");
        repo.fail(
            RepoStatus::Detached,
            format!("Detached HEAD state. Run: cd {rel} && git checkout <branch>"),
        );
        return options.allow_detached;
    };

    if !git::has_origin(git, &path).await {
        debug!(repo = %rel, "no origin remote");
        repo.fail(RepoStatus::NoRemote, "No remote 'origin' configured");
        return options.allow_no_remote;
    }

    let tracking = git::ahead_behind(git, &path, &branch).await;
    repo.tracking = Some(tracking);
    let (ahead, behind) = match tracking {
        git::Tracking::Remote { ahead, behind } => (ahead, behind),
        git::Tracking::NewBranch => (0, 0),
    };

    if options.check_sync && behind > 0 {
        return if ahead > 0 {
            repo.fail(
                RepoStatus::Diverged,
                format!(
                    "Diverged from remote ({ahead} ahead, {behind} behind). Run: cd {rel} && git pull --rebase"
                ),
            )
        } else {
            repo.fail(
                RepoStatus::Behind,
                format!("Behind remote by {behind} commits. Run: cd {rel} && git pull"),
            )
        };
    }

    repo.status = match tracking {
        git::Tracking::Remote { ahead: 0, .. } => RepoStatus::UpToDate,
        _ => RepoStatus::Pending,
    };
    debug!(repo = %rel, status = %repo.status, "validated");
    true
}

/// Validates every repository, returning the indices of the failures
pub async fn validate_all(
    repos: &mut [Repository],
    git: &dyn GitRunner,
    options: ValidateOptions,
) -> Vec<usize> {
    let mut failed = Vec::new();
    for (i, repo) in repos.iter_mut().enumerate() {
        if !validate(repo, git, options).await {
            failed.push(i);
        }
    }
    failed
}

/// Renders validation results as a table, optionally with a behind column
pub fn status_table(repos: &[Repository], show_behind: bool, palette: Palette) -> String {
    let rule = format!("  {}\n", "─".repeat(70));
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", palette.bold("Repository Status:")));
    out.push_str(&rule);
    if show_behind {
        out.push_str(&format!(
            "  {:<w$} {:<10} {:<8} {:<8} {:<12}\n",
            "Repository",
            "Branch",
            "Ahead",
            "Behind",
            "Status",
            w = NARROW_PATH_WIDTH
        ));
    } else {
        out.push_str(&format!(
            "  {:<w$} {:<12} {:<10} {:<12}\n",
            "Repository",
            "Branch",
            "Ahead",
            "Status",
            w = WIDE_PATH_WIDTH
        ));
    }
    out.push_str(&rule);

    for repo in repos {
        let status = palette.tone(repo.status.tone(), repo.status.text());
        let branch = repo.branch.as_deref().unwrap_or("?");
        if show_behind {
            let name = shorten_path(repo.rel_path(), NARROW_PATH_WIDTH);
            out.push_str(&format!(
                "  {:<w$} {:<10} {:<8} {:<8} {}\n",
                name,
                branch,
                repo.ahead_label(),
                repo.behind_label(),
                status,
                w = NARROW_PATH_WIDTH
            ));
        } else {
            let name = shorten_path(repo.rel_path(), WIDE_PATH_WIDTH);
            out.push_str(&format!(
                "  {:<w$} {:<12} {:<10} {}\n",
                name,
                branch,
                repo.ahead_label(),
                status,
                w = WIDE_PATH_WIDTH
            ));
        }
    }
    out.push_str(&rule);
    out
}

/// Prints the failure lines for every repository that failed validation
pub fn print_failures(repos: &[Repository], failed: &[usize], palette: Palette) {
    for repo in failed.iter().filter_map(|&i| repos.get(i)) {
        println!("  {} {}", palette.bad("✗"), repo.rel_path());
        println!(
            "    {}",
            palette.bad(repo.error_message.as_deref().unwrap_or("Unknown error"))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGit;
    use crate::git::Tracking;

    const UPSTREAM: &str = "rev-parse --abbrev-ref @{upstream}";
    const COUNT: &str = "rev-list --count --left-right @{upstream}...HEAD";

    fn repo() -> Repository {
        Repository::new("/w/docs", "/w")
    }

    fn on_main() -> FakeGit {
        FakeGit::new()
            .ok("branch --show-current", "main")
            .ok("remote get-url origin", "git@example.com:org/docs.git")
            .ok(UPSTREAM, "origin/main")
    }

    #[tokio::test]
    async fn test_up_to_date() {
        let git = on_main().ok(COUNT, "0\t0");
        let mut repo = repo();
        assert!(validate(&mut repo, &git, ValidateOptions::default()).await);
        assert_eq!(repo.status, RepoStatus::UpToDate);
        assert_eq!(repo.branch.as_deref(), Some("main"));
        assert_eq!(repo.error_message, None);
    }

    #[tokio::test]
    async fn test_pending_when_ahead() {
        let git = on_main().ok(COUNT, "0\t2");
        let mut repo = repo();
        assert!(validate(&mut repo, &git, ValidateOptions::default()).await);
        assert_eq!(repo.status, RepoStatus::Pending);
        assert_eq!(repo.tracking, Some(Tracking::Remote { ahead: 2, behind: 0 }));
    }

    #[tokio::test]
    async fn test_new_branch_is_pending() {
        let git = FakeGit::new()
            .ok("branch --show-current", "feature")
            .ok("remote get-url origin", "url")
            .fail(UPSTREAM)
            .ok("ls-remote --heads origin feature", "");
        let mut repo = repo();
        assert!(validate(&mut repo, &git, ValidateOptions::in_sync()).await);
        assert_eq!(repo.status, RepoStatus::Pending);
        assert_eq!(repo.ahead_label(), "new-branch");
    }

    #[tokio::test]
    async fn test_uncommitted_fails_regardless_of_options() {
        let git = on_main().fail("diff --quiet");
        let mut repo = repo();
        assert!(!validate(&mut repo, &git, ValidateOptions::tolerant()).await);
        assert_eq!(repo.status, RepoStatus::Uncommitted);
        assert!(repo
            .error_message
            .as_deref()
            .unwrap()
            .contains("cd docs && git status"));
        // Short-circuits before the branch query
        assert!(!git.called("branch"));
    }

    #[tokio::test]
    async fn test_detached_tolerance() {
        let git = FakeGit::new().ok("branch --show-current", "");

        let mut strict = repo();
        assert!(!validate(&mut strict, &git, ValidateOptions::default()).await);
        assert_eq!(strict.status, RepoStatus::Detached);

        let mut tolerant = repo();
        assert!(validate(&mut tolerant, &git, ValidateOptions::tolerant()).await);
        assert_eq!(tolerant.status, RepoStatus::Detached);
        assert_eq!(tolerant.branch, None);
    }

    #[tokio::test]
    async fn test_no_remote_tolerance() {
        let git = FakeGit::new()
            .ok("branch --show-current", "main")
            .fail("remote get-url origin");

        let mut strict = repo();
        assert!(!validate(&mut strict, &git, ValidateOptions::default()).await);
        assert_eq!(strict.status, RepoStatus::NoRemote);
        assert_eq!(strict.error_message.as_deref(), Some("No remote 'origin' configured"));

        let mut tolerant = repo();
        assert!(validate(&mut tolerant, &git, ValidateOptions::tolerant()).await);
        assert_eq!(tolerant.status, RepoStatus::NoRemote);
    }

    #[tokio::test]
    async fn test_behind_only_checked_with_sync() {
        let git = on_main().ok(COUNT, "3\t0");

        let mut relaxed = repo();
        assert!(validate(&mut relaxed, &git, ValidateOptions::default()).await);
        assert_eq!(relaxed.status, RepoStatus::UpToDate);

        let mut strict = repo();
        assert!(!validate(&mut strict, &git, ValidateOptions::in_sync()).await);
        assert_eq!(strict.status, RepoStatus::Behind);
        assert!(strict.error_message.unwrap().contains("Behind remote by 3 commits"));
    }

    #[tokio::test]
    async fn test_diverged_when_both_sides_moved() {
        let git = on_main().ok(COUNT, "2\t1");
        let mut repo = repo();
        assert!(!validate(&mut repo, &git, ValidateOptions::in_sync()).await);
        assert_eq!(repo.status, RepoStatus::Diverged);
        assert!(repo.error_message.unwrap().contains("git pull --rebase"));
    }

    #[tokio::test]
    async fn test_revalidation_resets_previous_verdict() {
        let mut repo = repo();
        let dirty = on_main().fail("diff --quiet");
        assert!(!validate(&mut repo, &dirty, ValidateOptions::default()).await);

        let clean = on_main().ok(COUNT, "0\t0");
        assert!(validate(&mut repo, &clean, ValidateOptions::default()).await);
        assert_eq!(repo.status, RepoStatus::UpToDate);
        assert_eq!(repo.error_message, None);
    }

    #[test]
    fn test_status_table_lists_every_repo() {
        let mut root = Repository::new("/w", "/w");
        root.branch = Some("main".to_string());
        root.status = RepoStatus::UpToDate;
        root.tracking = Some(Tracking::Remote { ahead: 0, behind: 0 });
        let mut docs = repo();
        docs.status = RepoStatus::Detached;

        let table = status_table(&[root, docs], true, Palette::plain());
        assert!(table.contains("Behind"));
        assert!(table.contains("(root)"));
        assert!(table.contains("up-to-date"));
        assert!(table.lines().any(|l| l.contains("docs") && l.contains("?") && l.contains("detached")));
    }

    #[tokio::test]
    async fn test_validate_all_collects_failures() {
        let git = on_main()
            .ok(COUNT, "0\t0")
            .fail_at("/w/b", "diff --quiet");
        let mut repos = vec![Repository::new("/w/a", "/w"), Repository::new("/w/b", "/w")];
        let failed = validate_all(&mut repos, &git, ValidateOptions::default()).await;
        assert_eq!(failed, vec![1]);
        assert_eq!(repos[0].status, RepoStatus::UpToDate);
    }
}
