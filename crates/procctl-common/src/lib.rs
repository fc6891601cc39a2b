//! # procctl-common
//!
//! Shared error taxonomy for the procctl workspace.
//!
//! Every crate in the workspace reports failures through [`ProcessError`]
//! and the [`ProcessResult`] alias defined here.

pub mod errors;

pub use errors::{ProcessError, ProcessResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
