//! Nested submodule project fixture
//!
//! ```text
//! <temp>/grandchild_origin      theme.txt; the shared "common" repository
//! <temp>/child_origin           index.rst + submodule common -> grandchild_origin
//! <temp>/parent_origin.git      bare remote of the project
//! <temp>/parent                 project root (.grove.toml)
//!   common/                     submodule -> grandchild_origin (on main)
//!   technical-docs/             submodule -> child_origin (on main)
//!     common/                   nested submodule -> grandchild_origin (detached)
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use grove::core::{Settings, Workspace};
use grove::utils::Palette;

use super::git::{configure_user, create_test_commit, git, setup_git_repo};

pub struct Project {
    pub temp_dir: TempDir,
    /// Canonical project root
    pub root: PathBuf,
    pub grandchild_origin: PathBuf,
    pub child_origin: PathBuf,
}

impl Project {
    pub fn build() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path().canonicalize()?;

        let grandchild_origin = base.join("grandchild_origin");
        setup_git_repo(&grandchild_origin)?;
        create_test_commit(&grandchild_origin, "theme.txt", "theme v1\n", "Initial theme")?;
        git(&grandchild_origin, &["config", "receive.denyCurrentBranch", "updateInstead"])?;

        let child_origin = base.join("child_origin");
        setup_git_repo(&child_origin)?;
        create_test_commit(&child_origin, "index.rst", "Docs\n", "Initial docs")?;
        add_submodule(&child_origin, &grandchild_origin, "common")?;
        git(&child_origin, &["commit", "--quiet", "-m", "Add common"])?;
        git(&child_origin, &["config", "receive.denyCurrentBranch", "updateInstead"])?;

        let root = base.join("parent");
        setup_git_repo(&root)?;
        let config = format!(
            "[sync-groups.common]\nurl-match = \"grandchild_origin\"\nstandalone-repo = \"{}\"\n",
            grandchild_origin.display()
        );
        create_test_commit(&root, ".grove.toml", &config, "Add grove config")?;
        add_submodule(&root, &grandchild_origin, "common")?;
        add_submodule(&root, &child_origin, "technical-docs")?;
        git(&root, &["commit", "--quiet", "-m", "Add submodules"])?;
        git(&root, &["submodule", "update", "--init", "--recursive", "--quiet"])?;

        for dir in ["common", "technical-docs", "technical-docs/common"] {
            configure_user(&root.join(dir))?;
        }

        let bare = base.join("parent_origin.git");
        git(&base, &["clone", "--bare", "--quiet", &root.display().to_string(), &bare.display().to_string()])?;
        git(&root, &["remote", "add", "origin", &bare.display().to_string()])?;
        git(&root, &["fetch", "--quiet", "origin"])?;
        git(&root, &["branch", "--quiet", "-u", "origin/main"])?;

        Ok(Self {
            temp_dir,
            root,
            grandchild_origin,
            child_origin,
        })
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Workspace over the project with the real git binary
    pub fn workspace(&self) -> Workspace {
        Workspace::open(&self.root, ".grove.toml", Palette::plain()).expect("project root")
    }

    pub fn settings(&self) -> Settings {
        Settings::load(&self.root).expect("settings")
    }

    /// Checks out the shared repository at one more place in the root
    pub fn add_common_location(&self, rel: &str) -> Result<()> {
        add_submodule(&self.root, &self.grandchild_origin, rel)?;
        git(&self.root, &["commit", "--quiet", "-m", &format!("Add {rel}")])?;
        configure_user(&self.root.join(rel))
    }

    /// Adds a commit to the shared repository and returns its SHA
    pub fn advance_common(&self, content: &str) -> Result<String> {
        create_test_commit(&self.grandchild_origin, "theme.txt", content, "Update theme")
    }
}

fn add_submodule(repo: &Path, origin: &Path, name: &str) -> Result<()> {
    git(repo, &["submodule", "add", "--quiet", &origin.display().to_string(), name])?;
    Ok(())
}
