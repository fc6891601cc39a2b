//! # procctl-process
//!
//! Low-level process operations for the procctl workspace.
//!
//! This crate provides Unix primitives for:
//! - Process spawning with bounded exit waits
//! - The signal vocabulary used for termination
//! - Process existence checking
//! - Command-based termination with a timeout escalation policy
//! - The helper-command runner seam used by `pgrep`-based discovery

pub mod check;
pub mod execute;
pub mod runner;
pub mod signal;
pub mod terminate;

// Re-export main types
pub use check::process_exists;
pub use execute::{launch, wait_for_exit, forcibly_kill, ProcessHandle, EXIT_CODE_UNKNOWN};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use signal::{number_of, with_leading_dash, Signal};
pub use terminate::{
    kill, kill_with_options, kill_with_signal, send_signal, KillOptions, TimeoutAction,
    DEFAULT_SIGNAL_TIMEOUT,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
