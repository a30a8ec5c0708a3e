//! Git testing utilities

use anyhow::Result;
use std::path::Path;
use std::process::Command;

/// Runs `git <args>` in `path`, returning trimmed stdout.
///
/// Local paths are valid submodule URLs in these fixtures, so the file
/// transport is always allowed.
pub fn git(path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(["-c", "protocol.file.allow=always"])
        .args(args)
        .current_dir(path)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()?;

    if !output.status.success() {
        anyhow::bail!(
            "git {} failed in {}: {}",
            args.join(" "),
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Configures identity and disables signing for commits made in `path`
pub fn configure_user(path: &Path) -> Result<()> {
    git(path, &["config", "user.name", "Test User"])?;
    git(path, &["config", "user.email", "test@example.com"])?;
    git(path, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

/// Sets up a git repository on `main` with user config
pub fn setup_git_repo(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    git(path, &["init", "--quiet"])?;
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    configure_user(path)?;
    Ok(())
}

/// Creates a test commit in the repository
pub fn create_test_commit(path: &Path, file_name: &str, content: &str, message: &str) -> Result<String> {
    std::fs::write(path.join(file_name), content)?;
    git(path, &["add", file_name])?;
    git(path, &["commit", "--quiet", "-m", message])?;
    head(path)
}

/// Full SHA of HEAD
pub fn head(path: &Path) -> Result<String> {
    git(path, &["rev-parse", "HEAD"])
}

/// Subject line of the last commit
pub fn last_subject(path: &Path) -> Result<String> {
    git(path, &["log", "-1", "--format=%s"])
}

/// Checks if git is available in the system
pub fn is_git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
