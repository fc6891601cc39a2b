//! Process existence checking.

use procctl_common::{ProcessError, ProcessResult};

/// Check whether a process with the given PID exists and is running.
///
/// Uses `kill(pid, 0)`, which delivers no signal but reports whether the
/// process exists. EPERM counts as existing: the process is there, we just
/// may not signal it.
pub fn process_exists(pid: i64) -> ProcessResult<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), None) {
        Ok(_) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(Errno::EPERM) => Ok(true),
        Err(e) => Err(ProcessError::signal_failed(pid, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_exists() {
        let current_pid = std::process::id() as i64;
        assert!(process_exists(current_pid).unwrap());
    }

    #[test]
    fn test_init_process_exists() {
        assert!(process_exists(1).unwrap());
    }
}
