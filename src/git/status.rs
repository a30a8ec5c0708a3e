//! Repository validation states

use std::fmt;

/// Validation state of a repository, set exclusively by the validator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RepoStatus {
    /// Not validated yet
    #[default]
    Ok,
    /// On a branch with commits the remote does not have
    Pending,
    /// On a branch with nothing to push
    UpToDate,
    /// Modified tracked files or staged changes
    Uncommitted,
    /// HEAD is not on a branch
    Detached,
    /// No `origin` remote configured
    NoRemote,
    /// Remote has commits the local branch lacks
    Behind,
    /// Both sides have commits the other lacks
    Diverged,
}

/// Display tone used when colouring a status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Good,
    Attention,
    Bad,
}

impl RepoStatus {
    /// Returns the text representation of this status
    pub fn text(&self) -> &'static str {
        match self {
            RepoStatus::Ok => "ok",
            RepoStatus::Pending => "pending",
            RepoStatus::UpToDate => "up-to-date",
            RepoStatus::Uncommitted => "uncommitted",
            RepoStatus::Detached => "detached",
            RepoStatus::NoRemote => "no-remote",
            RepoStatus::Behind => "behind",
            RepoStatus::Diverged => "diverged",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            RepoStatus::UpToDate => Tone::Good,
            RepoStatus::Pending => Tone::Attention,
            _ => Tone::Bad,
        }
    }
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
