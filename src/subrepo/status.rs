//! Sync-group drift detection

use std::collections::BTreeMap;

use super::SharedLocation;

/// How consistently one sync group's locations are pinned
#[derive(Debug)]
pub struct GroupDrift {
    pub group: String,
    pub locations: Vec<SharedLocation>,
    pub sync_score: f32,
    pub unique_commits: usize,
    pub has_drift: bool,
}

impl GroupDrift {
    /// Calculate sync score: (`locations` - `unique_commits`) / (`locations` - 1) × 100
    ///
    /// Examples:
    /// - 2 locations, same commit   → (2-1)/(2-1) = 100%
    /// - 2 locations, diff commits  → (2-2)/(2-1) = 0%
    /// - 3 locations, 2 commits     → (3-2)/(3-1) = 50%
    fn calculate_sync_score(locations: &[SharedLocation]) -> (f32, usize) {
        let unique_commits = Self::by_commit(locations).len();

        if locations.len() <= 1 {
            return (100.0, unique_commits);
        }

        let score =
            ((locations.len() - unique_commits) as f32) / ((locations.len() - 1) as f32) * 100.0;
        (score, unique_commits)
    }

    #[must_use]
    pub fn new(group: impl Into<String>, locations: Vec<SharedLocation>) -> Self {
        let (sync_score, unique_commits) = Self::calculate_sync_score(&locations);
        let has_drift = sync_score < 100.0;

        GroupDrift {
            group: group.into(),
            locations,
            sync_score,
            unique_commits,
            has_drift,
        }
    }

    /// Locations grouped by commit; unknown commits count as one distinct value
    pub fn by_commit(locations: &[SharedLocation]) -> BTreeMap<&str, Vec<&SharedLocation>> {
        let mut groups: BTreeMap<&str, Vec<&SharedLocation>> = BTreeMap::new();
        for location in locations {
            let commit = location.current_commit.as_deref().unwrap_or("unknown");
            groups.entry(commit).or_default().push(location);
        }
        groups
    }
}
