//! grove: nested git submodule management

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use grove::commands::{check, push, sync, worktree};
use grove::core::{PushOptions, Workspace, DEFAULT_ROOT_MARKER};
use grove::logging::init_logging;
use grove::subrepo::sync::SyncOptions;
use grove::utils::Palette;
use grove::worktree::AddOptions;

#[derive(Parser)]
#[command(name = "grove")]
#[command(version)]
#[command(about = "Git submodule management: health checks, bottom-up pushes, shared submodule sync and worktrees")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Start the project root search here instead of the current directory
    #[arg(short = 'C', long = "root", global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// File that marks the project root
    #[arg(long, global = true, default_value = DEFAULT_ROOT_MARKER, value_name = "FILE")]
    root_marker: String,

    /// Log every git invocation to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify submodules are on branches and sync groups are consistent
    Check {
        /// Show commit SHAs and every sync-group location
        #[arg(short, long)]
        verbose: bool,
    },
    /// Push committed changes through nested submodules bottom-up
    Push {
        /// Show what would be pushed without pushing
        #[arg(long)]
        dry_run: bool,
        /// Push even when validation fails (for recovery scenarios)
        #[arg(long)]
        force: bool,
    },
    /// Synchronize shared submodules across all their locations
    Sync {
        /// Sync group name (syncs all groups if omitted)
        group: Option<String>,
        /// Target commit SHA (defaults to latest main of the standalone repository)
        commit: Option<String>,
        /// Preview changes without making them
        #[arg(long)]
        dry_run: bool,
        /// Commit only, skip pushing
        #[arg(long)]
        no_push: bool,
        /// Proceed even when parent repositories fail validation
        #[arg(long)]
        force: bool,
        /// Check generated files for staleness afterwards
        #[arg(long)]
        verify: bool,
        /// Regenerate stale files (implies --verify)
        #[arg(long)]
        rebuild: bool,
    },
    /// Manage git worktrees with automatic submodule initialization
    #[command(subcommand)]
    Worktree(WorktreeCommands),
}

#[derive(Subcommand)]
enum WorktreeCommands {
    /// Create a new worktree with submodules initialized
    Add {
        /// Branch to create (or check out with --checkout)
        branch: String,
        /// Where the worktree should be created
        path: PathBuf,
        /// Check out an existing branch instead of creating one
        #[arg(long)]
        checkout: bool,
        /// Skip copying local git config from the main worktree's submodules
        #[arg(long)]
        no_copy_config: bool,
    },
    /// Remove a worktree and prune stale entries
    Remove {
        path: PathBuf,
        /// Remove even with uncommitted changes
        #[arg(long)]
        force: bool,
    },
}

async fn run(cli: Cli, command: Commands) -> anyhow::Result<i32> {
    let palette = Palette::from_env(cli.no_color);
    let start = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let ws = Workspace::open(&start, &cli.root_marker, palette)?;
    tracing::debug!(root = %ws.root.display(), "project root");

    match command {
        Commands::Check { verbose } => check::handle_check_command(&ws, verbose).await,
        Commands::Push { dry_run, force } => {
            push::handle_push_command(&ws, PushOptions { dry_run, force }).await
        }
        Commands::Sync {
            group,
            commit,
            dry_run,
            no_push,
            force,
            verify,
            rebuild,
        } => {
            let options = SyncOptions {
                dry_run,
                no_push,
                force,
                verify,
                rebuild,
            };
            sync::handle_sync_command(&ws, group.as_deref(), commit.as_deref(), options).await
        }
        Commands::Worktree(WorktreeCommands::Add {
            branch,
            path,
            checkout,
            no_copy_config,
        }) => {
            let options = AddOptions {
                checkout_existing: checkout,
                copy_config: !no_copy_config,
            };
            worktree::handle_worktree_add(&ws, &branch, &path, options).await
        }
        Commands::Worktree(WorktreeCommands::Remove { path, force }) => {
            worktree::handle_worktree_remove(&ws, &path, force).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();
    init_logging(cli.debug);

    let Some(command) = cli.command.take() else {
        let _ = Cli::command().print_help();
        return ExitCode::from(2);
    };
    let no_color = cli.no_color;

    match run(cli, command).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            let palette = Palette::from_env(no_color);
            eprintln!("{} {e:#}", palette.bad("Error:"));
            ExitCode::from(1)
        }
    }
}
