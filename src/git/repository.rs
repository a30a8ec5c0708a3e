//! Repository model
//!
//! A [`Repository`] is one working tree in the discovered set. It is rebuilt
//! from the filesystem on every run and carries the validator's verdict.

use std::path::{Path, PathBuf};

use super::status::RepoStatus;
use crate::core::config::ROOT_DISPLAY_NAME;

/// How the current branch relates to its remote counterpart
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tracking {
    /// Counts against the upstream or `origin/<branch>`
    Remote { ahead: u32, behind: u32 },
    /// The remote has no branch of this name yet
    NewBranch,
}

/// One repository working tree
#[derive(Clone, Debug)]
pub struct Repository {
    pub path: PathBuf,
    pub repo_root: PathBuf,
    rel_path: String,
    pub branch: Option<String>,
    pub tracking: Option<Tracking>,
    pub status: RepoStatus,
    pub error_message: Option<String>,
    /// Index of the nearest containing repository in the owning list
    pub parent: Option<usize>,
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>, repo_root: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let repo_root = repo_root.into();
        let rel_path = relative_display(&path, &repo_root);
        Self {
            path,
            repo_root,
            rel_path,
            branch: None,
            tracking: None,
            status: RepoStatus::Ok,
            error_message: None,
            parent: None,
        }
    }

    /// Path relative to the project root, `(root)` for the root itself
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    /// Directory name of the working tree
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn is_root(&self) -> bool {
        self.path == self.repo_root
    }

    /// Number of path components below the project root
    pub fn depth(&self) -> usize {
        self.path
            .strip_prefix(&self.repo_root)
            .map(|p| p.components().count())
            .unwrap_or(0)
    }

    /// Commits the remote lacks; a new branch counts as one unit of work
    pub fn ahead(&self) -> u32 {
        match self.tracking {
            Some(Tracking::Remote { ahead, .. }) => ahead,
            Some(Tracking::NewBranch) => 1,
            None => 0,
        }
    }

    pub fn behind(&self) -> u32 {
        match self.tracking {
            Some(Tracking::Remote { behind, .. }) => behind,
            _ => 0,
        }
    }

    pub fn ahead_label(&self) -> String {
        match self.tracking {
            Some(Tracking::Remote { ahead, .. }) => ahead.to_string(),
            Some(Tracking::NewBranch) => "new-branch".to_string(),
            None => "-".to_string(),
        }
    }

    pub fn behind_label(&self) -> String {
        match self.tracking {
            Some(Tracking::Remote { behind, .. }) => behind.to_string(),
            _ => "-".to_string(),
        }
    }

    /// Clears everything the validator sets
    pub(crate) fn reset_validation(&mut self) {
        self.tracking = None;
        self.status = RepoStatus::Ok;
        self.error_message = None;
    }

    pub(crate) fn fail(&mut self, status: RepoStatus, message: impl Into<String>) -> bool {
        self.status = status;
        self.error_message = Some(message.into());
        false
    }
}

fn relative_display(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ROOT_DISPLAY_NAME.to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
