//! `grove sync [group] [commit]`

use anyhow::{bail, Result};

use super::title;
use crate::core::{SyncGroup, Workspace};
use crate::subrepo::sync::{sync_group, SyncOptions};

/// Syncs one named group, or every configured group in name order.
///
/// The exit code is the worst of the per-group exit codes.
pub async fn handle_sync_command(
    ws: &Workspace,
    group: Option<&str>,
    commit: Option<&str>,
    options: SyncOptions,
) -> Result<i32> {
    let groups: Vec<&SyncGroup> = match group {
        Some(name) => vec![ws.settings.group(name)?],
        None if commit.is_some() => bail!("A target commit requires a sync group name"),
        None => ws.settings.sync_groups.iter().collect(),
    };

    title(ws, "🔄 grove sync");
    let mut exit_code = 0;

    for (i, group) in groups.iter().enumerate() {
        if groups.len() > 1 {
            if i > 0 {
                println!();
            }
            println!("{}", ws.palette.bold(format!("=== Sync group: {} ===", group.name)));
            println!();
        }

        match sync_group(ws, group, commit, options).await {
            Ok(report) => exit_code = exit_code.max(report.exit_code),
            // One broken group does not stop the others
            Err(e) if groups.len() > 1 => {
                println!("{} {e:#}", ws.palette.bad("Error:"));
                exit_code = 1;
            }
            Err(e) => return Err(e),
        }
    }

    title(ws, "✅ grove sync");
    Ok(exit_code)
}
