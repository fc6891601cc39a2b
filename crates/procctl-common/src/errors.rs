//! Error types for process control operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for process control operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Error type covering launching, querying, and terminating processes.
///
/// Each variant carries enough context (pid, command line, or offending
/// output line) to diagnose a failure without re-running at a higher log
/// level.
#[derive(Error, Debug, Clone)]
pub enum ProcessError {
    /// The OS refused to create a process.
    #[error("Failed to launch `{command}`: {reason}")]
    LaunchFailed { command: String, reason: String },

    /// A precondition violation caught before any process was spawned.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A `pgrep` output line whose pid token is not a non-negative integer.
    #[error("Unparseable pgrep output line: {line:?}")]
    ParseFailure { line: String },

    /// A single-result query observed more than one match.
    #[error("Expected at most one match for `{query}`, found {}: {matches:?}", .matches.len())]
    Multiplicity { query: String, matches: Vec<i64> },

    /// A termination request configured to fail on timeout did so.
    #[error("Signal to PID {pid} not confirmed within {timeout:?}")]
    TimeoutPolicy { pid: i64, timeout: Duration },

    /// Force-kill escalation could not confirm termination within its grace
    /// period. The target's true state is unknown at this point.
    #[error("PID {pid} still alive {grace:?} after SIGKILL")]
    EscalationFailed { pid: i64, grace: Duration },

    /// Direct signal delivery to a pid failed.
    #[error("Failed to signal PID {pid}: {reason}")]
    SignalFailed { pid: i64, reason: String },

    /// Waiting on a child process failed at the OS level.
    #[error("Failed to wait on PID {pid}: {reason}")]
    WaitFailed { pid: i64, reason: String },
}

impl ProcessError {
    pub fn launch_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LaunchFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn parse_failure(line: impl Into<String>) -> Self {
        Self::ParseFailure { line: line.into() }
    }

    pub fn multiplicity(query: impl Into<String>, matches: Vec<i64>) -> Self {
        Self::Multiplicity {
            query: query.into(),
            matches,
        }
    }

    pub fn signal_failed(pid: i64, reason: impl Into<String>) -> Self {
        Self::SignalFailed {
            pid,
            reason: reason.into(),
        }
    }

    pub fn wait_failed(pid: i64, reason: impl Into<String>) -> Self {
        Self::WaitFailed {
            pid,
            reason: reason.into(),
        }
    }
}
