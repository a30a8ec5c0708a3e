//! Public API for the core module.
//!
//! This module provides the stable public API for core functionality including:
//! - Project root location and settings
//! - Repository discovery and ordering
//! - Validation and the push workflow
//!
//! Internal implementation details are not exposed through this API.

// Project
pub use super::project::{locate_root, ProjectConfig, Settings, SyncGroup, SyncGroupConfig};
pub use super::workspace::Workspace;

// Discovery and ordering
pub use super::discovery::{discover, has_git_marker, DiscoveryOptions};
pub use super::graph::{build_graph, order_graph, set_parent_relationships, topological_sort, DependencyGraph};

// Validation and pushing
pub use super::push::{push_in_order, push_pending, push_repositories, PushOptions, PushOutcome, PushReport};
pub use super::validator::{status_table, validate, validate_all, ValidateOptions};

// Configuration
pub use super::config::{DEFAULT_ROOT_MARKER, DEFAULT_SYNC_GROUP};
