//! Submodule manifest parsing and shared-submodule handling
//!
//! `.gitmodules` files are parsed permissively: unknown keys, comments and
//! malformed lines are ignored. One parser serves both callers; filtering by
//! URL is a separate step on its output.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub mod locations;
pub mod staleness;
pub mod status;
pub mod sync;

pub use locations::{ancestor_repos, discover_locations, SharedLocation};
pub use status::GroupDrift;

/// One `[submodule "<name>"]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleEntry {
    pub name: String,
    /// Path relative to the repository holding the manifest
    pub path: String,
    pub url: Option<String>,
}

impl SubmoduleEntry {
    pub fn url_matches(&self, needle: &str) -> bool {
        self.url.as_deref().is_some_and(|url| url.contains(needle))
    }
}

#[derive(Default)]
struct Section {
    name: Option<String>,
    path: Option<String>,
    url: Option<String>,
}

impl Section {
    /// A section without a path falls back to its name; with neither it is dropped
    fn finish(self) -> Option<SubmoduleEntry> {
        let path = self.path.or_else(|| self.name.clone())?;
        Some(SubmoduleEntry {
            name: self.name.unwrap_or_else(|| path.clone()),
            path,
            url: self.url,
        })
    }
}

fn section_name(header: &str) -> Option<String> {
    let start = header.find('"')? + 1;
    let end = header.rfind('"')?;
    (end > start).then(|| header[start..end].to_string())
}

/// Parses every submodule section in `content`
pub fn parse_gitmodules(content: &str) -> Vec<SubmoduleEntry> {
    let mut entries = Vec::new();
    let mut current: Option<Section> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            if let Some(entry) = current.take().and_then(Section::finish) {
                entries.push(entry);
            }
            if line.starts_with("[submodule") {
                current = Some(Section {
                    name: section_name(line),
                    ..Section::default()
                });
            }
            continue;
        }

        let (Some(section), Some((key, value))) = (current.as_mut(), line.split_once('=')) else {
            continue;
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "path" => section.path = Some(value),
            "url" => section.url = Some(value),
            _ => {}
        }
    }

    if let Some(entry) = current.and_then(Section::finish) {
        entries.push(entry);
    }
    entries
}

/// Reads a manifest, keeping only entries whose URL contains `url_match`.
///
/// A missing file yields no entries.
pub fn read_gitmodules(file: &Path, url_match: Option<&str>) -> Result<Vec<SubmoduleEntry>> {
    if !file.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let entries = parse_gitmodules(&content);
    Ok(match url_match {
        Some(needle) => entries.into_iter().filter(|e| e.url_matches(needle)).collect(),
        None => entries,
    })
}
