// Internal modules - not part of public API
pub(crate) mod config;

pub mod discovery;
pub mod graph;
pub mod project;
pub mod push;
pub mod validator;
pub mod workspace;

// Public API - curated exports only
pub mod api;

// Re-export key items at module level for convenience
pub use api::*;
