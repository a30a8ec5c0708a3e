//! Project configuration and root detection
//!
//! A project is identified by a root-marker file. The optional project
//! configuration (`.grove.toml`) declares exclusions and sync groups; every
//! key has a default so an empty file is a valid configuration.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::config::{
    DEFAULT_COMMIT_MESSAGE_TEMPLATE, DEFAULT_EXCLUDE_NAMES, DEFAULT_FIX_FLAG, DEFAULT_SYNC_GROUP,
    GIT_OPERATION_TIMEOUT_SECS, PROJECT_CONFIG_FILE,
};
use crate::error::{GroveError, Result};

/// On-disk shape of `.grove.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    pub exclude_names: Option<Vec<String>>,
    pub commit_message: Option<String>,
    pub git_timeout_secs: Option<u64>,
    #[serde(default)]
    pub sync_groups: BTreeMap<String, SyncGroupConfig>,
}

/// On-disk shape of one `[sync-groups.<name>]` table
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncGroupConfig {
    pub url_match: Option<String>,
    pub standalone_repo: Option<String>,
    pub staleness_check: Option<Vec<String>>,
    pub fix_flag: Option<String>,
    pub commit_message: Option<String>,
}

impl ProjectConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| GroveError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// A named set of shared-submodule locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncGroup {
    pub name: String,
    /// Substring matched against submodule URLs
    pub url_match: String,
    /// Reference repository used to resolve "latest"
    pub standalone_repo: Option<PathBuf>,
    /// Explicit staleness command (program followed by arguments)
    pub staleness_check: Option<Vec<String>>,
    pub fix_flag: String,
    pub commit_message: String,
}

impl SyncGroup {
    /// Group with every optional setting at its default
    pub fn named(name: &str, url_match: &str) -> Self {
        Self {
            name: name.to_string(),
            url_match: url_match.to_string(),
            standalone_repo: None,
            staleness_check: None,
            fix_flag: DEFAULT_FIX_FLAG.to_string(),
            commit_message: default_commit_message(name),
        }
    }
}

fn default_commit_message(group: &str) -> String {
    DEFAULT_COMMIT_MESSAGE_TEMPLATE.replace("{group}", group)
}

/// Effective settings for one project
#[derive(Debug, Clone)]
pub struct Settings {
    pub exclude_names: Vec<String>,
    pub git_timeout: Option<Duration>,
    /// Ordered by name
    pub sync_groups: Vec<SyncGroup>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(ProjectConfig::default(), Path::new("."))
    }
}

impl Settings {
    /// Loads `<root>/.grove.toml`, falling back to defaults when it is absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_CONFIG_FILE);
        if !path.is_file() {
            debug!(root = %root.display(), "no project config, using defaults");
            return Ok(Self::from_config(ProjectConfig::default(), root));
        }

        let content = fs::read_to_string(&path).map_err(|e| GroveError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let config = ProjectConfig::parse(&content, &path)?;
        Ok(Self::from_config(config, root))
    }

    /// Applies defaults and resolves paths relative to `root`
    pub fn from_config(config: ProjectConfig, root: &Path) -> Self {
        let exclude_names = config.exclude_names.unwrap_or_else(|| {
            DEFAULT_EXCLUDE_NAMES.iter().map(|s| s.to_string()).collect()
        });

        let timeout_secs = config.git_timeout_secs.unwrap_or(GIT_OPERATION_TIMEOUT_SECS);
        let git_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let mut sync_groups: Vec<SyncGroup> = config
            .sync_groups
            .into_iter()
            .map(|(name, group)| {
                let commit_message = group
                    .commit_message
                    .or_else(|| config.commit_message.clone())
                    .unwrap_or_else(|| default_commit_message(&name));
                SyncGroup {
                    url_match: group.url_match.unwrap_or_else(|| name.clone()),
                    standalone_repo: group
                        .standalone_repo
                        .map(|p| resolve_path(&p, root)),
                    staleness_check: group.staleness_check.filter(|c| !c.is_empty()),
                    fix_flag: group
                        .fix_flag
                        .unwrap_or_else(|| DEFAULT_FIX_FLAG.to_string()),
                    commit_message,
                    name,
                }
            })
            .collect();

        if sync_groups.is_empty() {
            let mut group = SyncGroup::named(DEFAULT_SYNC_GROUP, DEFAULT_SYNC_GROUP);
            if let Some(message) = config.commit_message {
                group.commit_message = message;
            }
            sync_groups.push(group);
        }

        Self {
            exclude_names,
            git_timeout,
            sync_groups,
        }
    }

    /// Looks up a sync group by name
    pub fn group(&self, name: &str) -> Result<&SyncGroup> {
        self.sync_groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| GroveError::UnknownSyncGroup {
                name: name.to_string(),
                known: self
                    .sync_groups
                    .iter()
                    .map(|g| g.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Expands `~` and anchors relative paths at `root`
pub fn resolve_path(raw: &str, root: &Path) -> PathBuf {
    let expanded = if raw == "~" {
        dirs::home_dir()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        None
    };

    let path = expanded.unwrap_or_else(|| PathBuf::from(raw));
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

/// Walks up from `start` to the first directory containing `marker`
pub fn locate_root(start: &Path, marker: &str) -> Result<PathBuf> {
    let start = start
        .canonicalize()
        .unwrap_or_else(|_| start.to_path_buf());

    start
        .ancestors()
        .find(|dir| dir.join(marker).exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| GroveError::RootMarkerMissing {
            start: start.clone(),
            marker: marker.to_string(),
        })
}
