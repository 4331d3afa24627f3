//! Process-group termination
//!
//! Children are spawned as leaders of their own process group so that a
//! timeout can take down everything they started, not just the direct child.

use super::handler::{register_cleanup, unregister_cleanup};

/// Send SIGKILL to every process in the group led by `pid`
///
/// Idempotent: a group that is already gone is not an error.
pub fn kill_process_group(pid: u32) {
    #[cfg(unix)]
    {
        let Ok(pgid) = libc::pid_t::try_from(pid) else {
            return;
        };
        if pgid <= 1 {
            return;
        }

        // SAFETY: killpg only sends a signal; an invalid group yields ESRCH
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                tracing::debug!(pid, error = %err, "killpg failed");
            }
        }
    }
    #[cfg(not(unix))]
    {
        // Without process groups the caller's Child::kill covers the root
        let _ = pid;
    }
}

/// RAII guard that kills a child's process group when dropped
///
/// Also registered with the global cleanup registry so a signal delivered to
/// the engine takes the group down with it.
pub struct ProcessGroupGuard {
    pid: u32,
    registry_id: Option<u64>,
}

impl ProcessGroupGuard {
    pub fn new(pid: u32) -> Self {
        let registry_id = register_cleanup(format!("process group: PID {pid}"), move || {
            kill_process_group(pid)
        });

        Self { pid, registry_id }
    }

    /// Kill the group now; safe to call more than once
    pub fn kill(&self) {
        kill_process_group(self.pid);
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(id) = self.registry_id.take() {
            unregister_cleanup(id);
        }
        // Sweeps up anything the program left running in the background
        kill_process_group(self.pid);
    }
}
