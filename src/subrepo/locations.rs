//! Shared-submodule locations
//!
//! A location is one checked-out copy of a sync group's submodule, found by
//! scanning every `.gitmodules` below the project root.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::read_gitmodules;
use crate::core::config::GITMODULES_FILE;
use crate::core::discovery::{has_git_marker, walk_directories};
use crate::git::{self, GitRunner, Repository};

/// One checkout of a shared submodule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLocation {
    pub path: PathBuf,
    /// Repository whose manifest declares this submodule
    pub parent_repo: PathBuf,
    /// Path as declared in the parent's manifest
    pub rel_path: String,
    pub current_commit: Option<String>,
}

impl SharedLocation {
    /// Whether HEAD is already at `target` (prefix match)
    pub fn is_at(&self, target: &str) -> bool {
        self.current_commit
            .as_deref()
            .is_some_and(|current| !target.is_empty() && current.starts_with(target))
    }

    /// Path relative to `root` for display
    pub fn display_path(&self, root: &Path) -> String {
        self.path
            .strip_prefix(root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| self.path.display().to_string())
    }

    pub fn short_commit(&self) -> &str {
        self.current_commit
            .as_deref()
            .map(|c| &c[..c.len().min(crate::core::config::SHORT_SHA_LENGTH)])
            .unwrap_or("unknown")
    }
}

/// Finds every checked-out submodule under `root` whose URL contains `url_match`.
///
/// Declared submodules that are not initialised (no `.git` in their
/// directory) are skipped.
pub async fn discover_locations(
    git: &dyn GitRunner,
    root: &Path,
    url_match: &str,
) -> Result<Vec<SharedLocation>> {
    let mut locations = Vec::new();

    for dir in walk_directories(root) {
        let manifest = dir.join(GITMODULES_FILE);
        if !manifest.is_file() {
            continue;
        }

        for entry in read_gitmodules(&manifest, Some(url_match))? {
            let full_path = dir.join(&entry.path);
            if !full_path.join(".git").exists() {
                debug!(path = %full_path.display(), "declared but not checked out");
                continue;
            }

            let current_commit = git::rev_parse(git, &full_path, "HEAD").await;
            locations.push(SharedLocation {
                path: full_path,
                parent_repo: dir.clone(),
                rel_path: entry.path,
                current_commit,
            });
        }
    }

    Ok(locations)
}

/// Repositories that need a commit once `locations` change, deepest first.
///
/// Walks up from each location's parent repository to `root`, registering
/// every directory that is itself a repository. The root is always included.
pub fn ancestor_repos<'a>(
    locations: impl IntoIterator<Item = &'a SharedLocation>,
    root: &Path,
) -> Vec<Repository> {
    let mut paths: BTreeSet<PathBuf> = BTreeSet::new();
    paths.insert(root.to_path_buf());

    for location in locations {
        paths.insert(location.parent_repo.clone());
        for dir in location.parent_repo.ancestors().skip(1) {
            if !dir.starts_with(root) {
                break;
            }
            if has_git_marker(dir) {
                paths.insert(dir.to_path_buf());
            }
        }
    }

    let mut repos: Vec<Repository> = paths.into_iter().map(|p| Repository::new(p, root)).collect();
    // Stable sort keeps path order among equal depths
    repos.sort_by_key(|r| std::cmp::Reverse(r.depth()));
    repos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGit;
    use std::fs;
    use tempfile::TempDir;

    fn checked_out(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(".git"), "gitdir: ../.git/modules/x\n").unwrap();
    }

    fn location(path: &str, parent: &str) -> SharedLocation {
        SharedLocation {
            path: PathBuf::from(path),
            parent_repo: PathBuf::from(parent),
            rel_path: "common".to_string(),
            current_commit: None,
        }
    }

    #[tokio::test]
    async fn test_discovers_checked_out_matches_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::write(
            root.join(".gitmodules"),
            "[submodule \"common\"]\n path = common\n url = ../website-common.git\n\
             [submodule \"docs\"]\n path = docs\n url = ../docs.git\n\
             [submodule \"stale\"]\n path = stale\n url = ../website-common.git\n",
        )
        .unwrap();
        checked_out(&root.join("common"));
        checked_out(&root.join("docs"));
        fs::write(
            root.join("docs/.gitmodules"),
            "[submodule \"common\"]\n path = vendor/common\n url = ../website-common.git\n",
        )
        .unwrap();
        checked_out(&root.join("docs/vendor/common"));

        let root_str = root.join("common").display().to_string();
        let git = FakeGit::new().ok_at(&root_str, "rev-parse HEAD", "abc1234def");

        let found = discover_locations(&git, &root, "website-common").await.unwrap();
        let rels: Vec<_> = found.iter().map(|l| l.display_path(&root)).collect();
        assert_eq!(rels, vec!["common", "docs/vendor/common"]);

        assert_eq!(found[0].parent_repo, root);
        assert_eq!(found[0].current_commit.as_deref(), Some("abc1234def"));
        assert_eq!(found[1].parent_repo, root.join("docs"));
        assert_eq!(found[1].rel_path, "vendor/common");
    }

    #[test]
    fn test_is_at_prefix_match() {
        let mut loc = location("/w/common", "/w");
        assert!(!loc.is_at("abc1234"));

        loc.current_commit = Some("abc1234ffffffffffffffffffffffffffffffff0".to_string());
        assert!(loc.is_at("abc1234"));
        assert!(loc.is_at("abc1234ffffffffffffffffffffffffffffffff0"));
        assert!(!loc.is_at("abc1235"));
        assert!(!loc.is_at(""));
        assert_eq!(loc.short_commit(), "abc1234");
    }

    #[test]
    fn test_ancestors_deepest_first() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        checked_out(&root.join("docs"));
        checked_out(&root.join("docs/project"));

        let locs = vec![
            location(root.join("docs/project/common").to_str().unwrap(), root.join("docs/project").to_str().unwrap()),
            location(root.join("common").to_str().unwrap(), root.to_str().unwrap()),
        ];
        let repos = ancestor_repos(&locs, &root);
        let rels: Vec<_> = repos.iter().map(|r| r.rel_path().to_string()).collect();
        assert_eq!(rels, vec!["docs/project", "docs", "(root)"]);
    }
}
