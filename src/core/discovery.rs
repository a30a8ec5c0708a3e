//! Repository discovery
//!
//! Walks the project tree and returns every repository found below the root,
//! root first, in directory-walk order.

use ignore::WalkBuilder;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::config::{DEFAULT_EXCLUDE_NAMES, SKIP_DIRECTORIES};
use crate::git::Repository;

/// Controls which repositories discovery reports
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Directory names of shared, pinned submodules
    pub exclude_names: Vec<String>,
    /// Drop repositories whose directory name is in `exclude_names`
    pub exclude_shared: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            exclude_names: DEFAULT_EXCLUDE_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_shared: true,
        }
    }
}

impl DiscoveryOptions {
    pub fn new(exclude_names: &[String], exclude_shared: bool) -> Self {
        Self {
            exclude_names: exclude_names.to_vec(),
            exclude_shared,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_shared
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| self.exclude_names.iter().any(|e| e == name))
    }
}

/// Check if a .git file (for submodules/worktrees) contains gitdir reference
/// Only reads the first 5 lines for efficiency
fn is_git_file(path: &Path) -> bool {
    match fs::File::open(path) {
        Ok(file) => {
            let reader = BufReader::new(file);
            // Only read first few lines - gitdir is typically in the first line
            reader
                .lines()
                .take(5)
                .map_while(Result::ok)
                .any(|line| line.trim_start().starts_with("gitdir:"))
        }
        Err(_) => false,
    }
}

/// True when `dir` holds a `.git` directory or a submodule `.git` file
pub fn has_git_marker(dir: &Path) -> bool {
    let marker = dir.join(".git");
    marker.is_dir() || (marker.is_file() && is_git_file(&marker))
}

/// Walks the tree below `root` in sorted order, yielding candidate directories.
///
/// Dependency caches and `.git` internals are never entered.
pub(crate) fn walk_directories(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let file_name = entry.file_name().to_str().unwrap_or("");
            if entry.depth() == 0 {
                return true;
            }
            file_name != ".git" && !SKIP_DIRECTORIES.contains(&file_name)
        })
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_dir()))
        .map(ignore::DirEntry::into_path)
}

/// Finds every repository under `root`.
///
/// The root is always the first element. Nested repositories follow in walk
/// order; a directory whose name is excluded is left out but its descendants
/// are still scanned. Parent links are not set here.
pub fn discover(root: &Path, options: &DiscoveryOptions) -> Vec<Repository> {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut repos = vec![Repository::new(&root, &root)];

    for dir in walk_directories(&root) {
        if dir == root || !has_git_marker(&dir) {
            continue;
        }
        if options.is_excluded(&dir) {
            debug!(path = %dir.display(), "skipping shared submodule");
            continue;
        }
        debug!(path = %dir.display(), "found repository");
        repos.push(Repository::new(dir, &root));
    }

    repos
}
