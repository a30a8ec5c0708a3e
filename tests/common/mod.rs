//! Common test utilities and helpers
#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod git;

pub use self::fixtures::Project;
pub use self::git::{create_test_commit, git, head, is_git_available, last_subject, setup_git_repo};

/// Builds the fixture, or returns `None` (after saying why) when git is unavailable
pub fn project() -> Option<Project> {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return None;
    }
    Some(Project::build().expect("Failed to build fixture project"))
}
