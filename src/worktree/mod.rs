//! Worktree management with submodule initialization
//!
//! A new worktree starts with empty submodule directories. They are filled
//! from the matching checkouts of a reference worktree (the project root)
//! so no submodule has to be cloned over the network again.

use anyhow::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tracing::{debug, warn};

use crate::core::config::{COPIED_CONFIG_KEYS, GITMODULES_FILE};
use crate::core::workspace::Workspace;
use crate::error::GroveError;
use crate::git::{self, operations::exec, GitRunner};
use crate::subrepo::read_gitmodules;
use crate::utils::Palette;

/// Lets `submodule update` clone from the local paths the URLs are pointed at
const LOCAL_TRANSPORT_ARGS: &[&str] = &["-c", "protocol.file.allow=always"];

#[derive(Debug, Clone, Copy)]
pub struct AddOptions {
    /// Check out an existing branch instead of creating one
    pub checkout_existing: bool,
    /// Copy identity settings from the reference submodules
    pub copy_config: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            checkout_existing: false,
            copy_config: true,
        }
    }
}

type InitFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Initializes the submodules of `worktree`, then recurses into each one.
///
/// Submodules already checked out under `reference` get their URL pointed at
/// that copy before `submodule update`. The overrides are left in place; the
/// caller undoes them with one recursive `submodule sync`.
fn init_submodules<'a>(git: &'a dyn GitRunner, worktree: &'a Path, reference: &'a Path) -> InitFuture<'a> {
    Box::pin(async move {
        let manifest = worktree.join(GITMODULES_FILE);
        if !manifest.is_file() {
            return true;
        }

        if !exec(git, worktree, &["submodule", "init"]).await.success {
            println!("  git submodule init failed in {}", worktree.display());
            return false;
        }

        let entries = match read_gitmodules(&manifest, None) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "unreadable submodule manifest");
                return false;
            }
        };

        for entry in &entries {
            let local = reference.join(&entry.path);
            if !local.exists() {
                continue;
            }
            let key = format!("submodule.{}.url", entry.name);
            let url = local.display().to_string();
            debug!(submodule = %entry.name, url = %url, "pointing submodule at reference copy");
            exec(git, worktree, &["config", &key, &url]).await;
        }

        let mut update = LOCAL_TRANSPORT_ARGS.to_vec();
        update.extend(["submodule", "update"]);
        if !exec(git, worktree, &update).await.success {
            println!("  git submodule update failed in {}", worktree.display());
            return false;
        }

        for entry in &entries {
            let sub_worktree = worktree.join(&entry.path);
            let sub_reference = reference.join(&entry.path);
            if !init_submodules(git, &sub_worktree, &sub_reference).await {
                return false;
            }
        }
        true
    })
}

/// Copies local identity settings from every reference submodule into its
/// counterpart in `worktree`, at every nesting level.
async fn copy_submodule_config(git: &dyn GitRunner, worktree: &Path, reference: &Path) -> usize {
    let mut copied = 0;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(worktree.to_path_buf(), reference.to_path_buf())];

    while let Some((dir, ref_dir)) = pending.pop() {
        let entries = read_gitmodules(&dir.join(GITMODULES_FILE), None).unwrap_or_default();
        for entry in entries {
            let target = dir.join(&entry.path);
            let source = ref_dir.join(&entry.path);
            if !target.join(".git").exists() || !source.join(".git").exists() {
                continue;
            }
            for key in COPIED_CONFIG_KEYS {
                if let Some(value) = git::get_local_config(git, &source, key).await {
                    if git::set_local_config(git, &target, key, &value).await {
                        copied += 1;
                    }
                }
            }
            pending.push((target, source));
        }
    }
    copied
}

fn print_location(path: &Path, branch: &str) {
    println!("  Path:   {}", path.display());
    println!("  Branch: {branch}");
}

/// Creates a worktree for `branch` at `path` and populates its submodules.
///
/// A failure after the worktree exists leaves it on disk and returns exit
/// code 1 with guidance.
pub async fn add_worktree(ws: &Workspace, branch: &str, path: &Path, options: AddOptions) -> Result<i32> {
    let git = ws.git();
    let palette: Palette = ws.palette;

    if path.exists() {
        return Err(GroveError::PathExists(path.to_path_buf()).into());
    }

    let target = path.display().to_string();
    let args: Vec<&str> = if options.checkout_existing {
        vec!["worktree", "add", &target, branch]
    } else {
        vec!["worktree", "add", "-b", branch, &target]
    };

    println!(
        "{} at {} on branch {}...",
        palette.bold("Creating worktree"),
        path.display(),
        palette.good(branch)
    );
    let created = exec(git, &ws.root, &args).await;
    if !created.success {
        println!("{}", palette.bad("Failed to create worktree"));
        if !created.stderr.is_empty() {
            println!("  {}", created.stderr);
        }
        return Ok(1);
    }

    println!(
        "{} (using main worktree as reference)...",
        palette.bold("Initializing submodules")
    );
    let initialized = init_submodules(git, path, &ws.root).await;

    // Undo every URL override, whether or not initialization finished
    if path.join(GITMODULES_FILE).is_file() {
        exec(git, path, &["submodule", "sync", "--recursive"]).await;
    }

    if !initialized {
        println!();
        println!(
            "{}: worktree created but submodule initialization failed.",
            palette.attention("Warning")
        );
        print_location(path, branch);
        println!("  You may need to initialize submodules manually:");
        println!("    cd {} && git submodule update --init --recursive", path.display());
        return Ok(1);
    }

    if options.copy_config {
        let copied = copy_submodule_config(git, path, &ws.root).await;
        debug!(copied, "copied submodule config values");
    }

    println!();
    println!("{}", palette.good("Worktree created successfully"));
    print_location(path, branch);
    Ok(0)
}

/// Removes the worktree at `path`, then prunes stale worktree metadata
pub async fn remove_worktree(ws: &Workspace, path: &Path, force: bool) -> Result<i32> {
    let git = ws.git();
    let palette = ws.palette;

    let target = path.display().to_string();
    let mut args = vec!["worktree", "remove"];
    if force {
        args.push("--force");
    }
    args.push(&target);

    println!("{} at {}...", palette.bold("Removing worktree"), path.display());
    let removed = exec(git, &ws.root, &args).await;
    exec(git, &ws.root, &["worktree", "prune"]).await;

    if !removed.success {
        println!("{}", palette.bad("Failed to remove worktree"));
        if !removed.stderr.is_empty() {
            println!("  {}", removed.stderr);
        }
        return Ok(1);
    }

    println!("{}", palette.good("Worktree removed successfully"));
    Ok(0)
}
