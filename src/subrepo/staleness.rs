//! Advisory staleness check for generated files
//!
//! Runs an external checker inside a shared-submodule location. The outcome
//! is reported to the user but never fails a sync on its own.

use std::fmt;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::config::{DEFAULT_STALENESS_RUNNER, DEFAULT_STALENESS_SCRIPT};

/// Result of one staleness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// No checker configured and no default script present
    Unavailable,
    UpToDate,
    /// The checker fixed stale files itself
    Regenerated,
    Stale,
    Failed(String),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::Unavailable => f.write_str("staleness check not available"),
            Staleness::UpToDate => f.write_str("up-to-date"),
            Staleness::Regenerated => f.write_str("regenerated"),
            Staleness::Stale => f.write_str("stale"),
            Staleness::Failed(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// The command to run in `location`, if any
fn resolve_command(location: &Path, configured: Option<&[String]>) -> Option<Vec<String>> {
    if let Some(command) = configured.filter(|c| !c.is_empty()) {
        return Some(command.to_vec());
    }
    let script = location.join(DEFAULT_STALENESS_SCRIPT);
    script.is_file().then(|| {
        vec![
            DEFAULT_STALENESS_RUNNER.to_string(),
            script.display().to_string(),
        ]
    })
}

/// Checks `location` for stale generated files; `rebuild` appends `fix_flag`
pub async fn check_staleness(
    location: &Path,
    configured: Option<&[String]>,
    fix_flag: &str,
    rebuild: bool,
) -> Staleness {
    let Some(mut command) = resolve_command(location, configured) else {
        return Staleness::Unavailable;
    };
    if rebuild {
        command.push(fix_flag.to_string());
    }

    let (program, args) = match command.split_first() {
        Some(split) => split,
        None => return Staleness::Unavailable,
    };
    debug!(location = %location.display(), command = %command.join(" "), "staleness check");

    let output = match Command::new(program)
        .args(args)
        .current_dir(location)
        .stdin(std::process::Stdio::null())
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            warn!(location = %location.display(), error = %e, "staleness check could not run");
            return Staleness::Failed(e.to_string());
        }
    };

    if !output.status.success() {
        return Staleness::Stale;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
    if rebuild && stdout.contains("regenerated") {
        Staleness::Regenerated
    } else {
        Staleness::UpToDate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unavailable_without_script() {
        let temp = TempDir::new().unwrap();
        let outcome = check_staleness(temp.path(), None, "--fix", false).await;
        assert_eq!(outcome, Staleness::Unavailable);
        assert!(!outcome.is_stale());
    }

    #[test]
    fn test_default_script_used_when_present() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("scripts")).unwrap();
        std::fs::write(temp.path().join(DEFAULT_STALENESS_SCRIPT), "").unwrap();

        let command = resolve_command(temp.path(), None).unwrap();
        assert_eq!(command[0], "node");
        assert!(command[1].ends_with("check-staleness.js"));
    }

    #[test]
    fn test_configured_command_wins() {
        let temp = TempDir::new().unwrap();
        let configured = vec!["make".to_string(), "check".to_string()];
        let command = resolve_command(temp.path(), Some(configured.as_slice())).unwrap();
        assert_eq!(command, configured);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_decides_outcome() {
        let temp = TempDir::new().unwrap();
        let passing = vec!["true".to_string()];
        assert_eq!(
            check_staleness(temp.path(), Some(passing.as_slice()), "--fix", false).await,
            Staleness::UpToDate
        );

        let failing = vec!["false".to_string()];
        assert_eq!(
            check_staleness(temp.path(), Some(failing.as_slice()), "--fix", false).await,
            Staleness::Stale
        );

        let regenerating = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo Regenerated 2 files".to_string(),
        ];
        assert_eq!(
            check_staleness(temp.path(), Some(regenerating.as_slice()), "--fix", true).await,
            Staleness::Regenerated
        );

        let missing = vec!["grove-no-such-checker".to_string()];
        assert!(matches!(
            check_staleness(temp.path(), Some(missing.as_slice()), "--fix", false).await,
            Staleness::Failed(_)
        ));
    }
}
