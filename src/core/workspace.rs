//! Explicit run context
//!
//! Everything a command needs that would otherwise be global: the project
//! root, its settings, the git runner and the colour palette.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::project::{locate_root, Settings};
use crate::error::Result;
use crate::git::{GitRunner, SystemGit};
use crate::utils::Palette;

#[derive(Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub settings: Settings,
    pub git: Arc<dyn GitRunner>,
    pub palette: Palette,
}

impl Workspace {
    pub fn new(
        root: impl Into<PathBuf>,
        settings: Settings,
        git: Arc<dyn GitRunner>,
        palette: Palette,
    ) -> Self {
        Self {
            root: root.into(),
            settings,
            git,
            palette,
        }
    }

    /// Locates the project root from `start` and loads its settings.
    ///
    /// The root is canonicalized so repository paths found under it compare
    /// equal to paths produced by git.
    pub fn open(start: &Path, marker: &str, palette: Palette) -> Result<Self> {
        let root = locate_root(start, marker)?;
        let settings = Settings::load(&root)?;
        let git: Arc<dyn GitRunner> = Arc::new(SystemGit::with_timeout(settings.git_timeout));
        Ok(Self::new(root, settings, git, palette))
    }

    pub fn git(&self) -> &dyn GitRunner {
        self.git.as_ref()
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .field("settings", &self.settings)
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}
