//! Error types for grove operations
//!
//! Typed errors for the conditions callers need to tell apart: a missing
//! project root, an unresolvable or malformed target commit, an invalid
//! project configuration, or a broken dependency graph. Everything else
//! travels as `anyhow::Error` with context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running grove operations
#[derive(Debug, Error)]
pub enum GroveError {
    /// The start directory is not inside a project carrying the root marker
    #[error("Must run from the project repository: no '{marker}' found in {start} or any parent")]
    RootMarkerMissing { start: PathBuf, marker: String },

    /// A commit-ish supplied by the user is not a plausible hex SHA
    #[error("Invalid commit SHA: {0}")]
    InvalidCommit(String),

    /// The configured standalone repository does not exist on disk
    #[error("Standalone repository not found at {0}; specify a commit SHA explicitly")]
    StandaloneRepoMissing(PathBuf),

    /// No standalone repository is configured and no commit was given
    #[error("No standalone repository configured for sync group '{0}'; specify a commit SHA explicitly")]
    NoStandaloneRepo(String),

    /// Neither origin/main nor main could be resolved
    #[error("Could not resolve commit from {0}")]
    TargetUnresolved(PathBuf),

    /// Sync group requested by name does not exist
    #[error("Unknown sync group '{name}' (configured: {known})")]
    UnknownSyncGroup { name: String, known: String },

    /// Internal invariant violation: nesting edges can never form a cycle
    #[error("Internal error: dependency cycle detected among {0:?}")]
    DependencyCycle(Vec<PathBuf>),

    /// Project configuration could not be read or parsed
    #[error("Invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// Target path for a new worktree is already taken
    #[error("Path already exists: {0}")]
    PathExists(PathBuf),

    /// A git command that must succeed did not
    #[error("git {args} failed in {path}: {stderr}")]
    Git {
        path: PathBuf,
        args: String,
        stderr: String,
    },
}

/// Result type alias using GroveError
pub type Result<T> = std::result::Result<T, GroveError>;
