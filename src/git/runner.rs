//! Subprocess seam for every git invocation
//!
//! The engine never talks to git directly: it asks a [`GitRunner`] to run a
//! command in a working directory and inspects exit status and text output.
//! Production code uses [`SystemGit`]; tests substitute a scripted runner.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::core::config::GIT_OPERATION_TIMEOUT_SECS;

/// Captured result of one git invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// Successful invocation with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed invocation (exit 1) with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs git commands against a specific working directory
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Runs `git <args>` in `path`.
    ///
    /// A non-zero exit is not an error: it comes back as `success == false`.
    /// `Err` is reserved for failing to spawn or wait on the process.
    async fn run(&self, path: &Path, args: &[&str]) -> Result<GitOutput>;
}

/// Runs the real `git` binary through tokio
#[derive(Debug, Clone)]
pub struct SystemGit {
    timeout: Option<Duration>,
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::with_timeout(Some(Duration::from_secs(GIT_OPERATION_TIMEOUT_SECS)))
    }
}

impl SystemGit {
    /// `None` lets every command run to completion
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl GitRunner for SystemGit {
    async fn run(&self, path: &Path, args: &[&str]) -> Result<GitOutput> {
        debug!(path = %path.display(), args = %args.join(" "), "git");

        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result?,
                Err(_) => anyhow::bail!(
                    "git {} timed out after {} seconds",
                    args.join(" "),
                    limit.as_secs()
                ),
            },
            None => command.output().await?,
        };

        let result = GitOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        if !result.success {
            debug!(code = ?result.code, stderr = %result.stderr, "git command failed");
        }
        Ok(result)
    }
}
