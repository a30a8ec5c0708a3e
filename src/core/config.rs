//! Configuration constants and settings

// Git subprocess timeout; 0 in the project config disables it
pub const GIT_OPERATION_TIMEOUT_SECS: u64 = 180;

// Project root detection
pub const DEFAULT_ROOT_MARKER: &str = ".grove.toml";
pub const PROJECT_CONFIG_FILE: &str = ".grove.toml";

// Directory names treated as shared, pinned submodules during discovery
pub const DEFAULT_EXCLUDE_NAMES: &[&str] = &["common", "theme"];

// Sync group used when the project config declares none
pub const DEFAULT_SYNC_GROUP: &str = "common";
pub const DEFAULT_COMMIT_MESSAGE_TEMPLATE: &str = "chore: update {group} submodule";

// Staleness verification defaults
pub const DEFAULT_STALENESS_SCRIPT: &str = "scripts/check-staleness.js";
pub const DEFAULT_STALENESS_RUNNER: &str = "node";
pub const DEFAULT_FIX_FLAG: &str = "--fix";

// Submodule manifest file name
pub const GITMODULES_FILE: &str = ".gitmodules";

// Local identity settings copied into new worktrees
pub const COPIED_CONFIG_KEYS: &[&str] = &[
    "user.name",
    "user.email",
    "user.signingkey",
    "commit.gpgsign",
];

// Display formatting constants
pub const ROOT_DISPLAY_NAME: &str = "(root)";
// Repository column width of the status table, with and without a behind column
pub const NARROW_PATH_WIDTH: usize = 40;
pub const WIDE_PATH_WIDTH: usize = 45;
pub const SHORT_SHA_LENGTH: usize = 7;

// Commit-ish accepted from the command line
pub const MIN_SHA_LENGTH: usize = 7;
pub const MAX_SHA_LENGTH: usize = 40;

// Dependency caches never hold submodules and are not searched
pub const SKIP_DIRECTORIES: &[&str] = &["node_modules", ".venv", "venv", "__pycache__", ".next"];
