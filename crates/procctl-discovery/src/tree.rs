//! Direct-child queries over the process tree.

use crate::query::{parse_pid_lines, single_or_error};
use procctl_common::ProcessResult;
use procctl_process::runner::{CommandRunner, SystemRunner};
use std::sync::Arc;

/// Queries direct children of a parent pid via `pgrep -P`.
pub struct ProcessTree {
    runner: Arc<dyn CommandRunner>,
}

impl Default for ProcessTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTree {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Returns the direct child pids of `parent_pid`; empty if it has no
    /// children.
    pub async fn find_child_pids(&self, parent_pid: i64) -> ProcessResult<Vec<i64>> {
        let command = vec![
            "pgrep".to_string(),
            "-P".to_string(),
            parent_pid.to_string(),
        ];
        let output = self.runner.run(&command).await?;
        parse_pid_lines(&output.stdout)
    }

    /// Variant of [`find_child_pids`] for call sites expecting at most one
    /// child. "No children" is `None`, not an error.
    pub async fn find_single_child_pid(&self, parent_pid: i64) -> ProcessResult<Option<i64>> {
        let pids = self.find_child_pids(parent_pid).await?;
        single_or_error(pids, &format!("children of PID {parent_pid}"))
    }
}
