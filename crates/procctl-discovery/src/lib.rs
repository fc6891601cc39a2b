//! # procctl-discovery
//!
//! `pgrep`-based process discovery for the procctl workspace.
//!
//! This crate provides:
//! - A one-time capability probe for the host's `pgrep` flag dialect
//! - Pattern queries returning pids or (pid, command) pairs
//! - Direct-child queries over the process tree
//!
//! `pgrep` flag dialects differ across process-utility implementations;
//! [`capability::pgrep_capabilities`] reports which dialect was detected and
//! whether detection succeeded, so callers can decide how much to trust
//! `pgrep`-dependent features.

pub mod capability;
pub mod query;
pub mod tree;

// Re-export main types
pub use capability::{pgrep_capabilities, PgrepCapabilities};
pub use query::{ProcessMatch, ProcessQuery};
pub use tree::ProcessTree;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
