pub mod operations;
pub mod repository;
pub mod runner;
pub mod status;

#[cfg(test)]
pub(crate) mod fake;

// Re-export commonly used items
pub use operations::*;
pub use repository::{Repository, Tracking};
pub use runner::{GitOutput, GitRunner, SystemGit};
pub use status::{RepoStatus, Tone};
