//! Session-scoped process registry.
//!
//! Tracks code executions that outlived their timeout. Identifiers come
//! from a monotonic counter so an identifier is never reused within a
//! session, even after entries are terminated out of order.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::process::Child;
use tracing::{debug, info};

use super::ProcessError;

/// A background process owned by the registry.
///
/// The registry holds the only handle to the running child for the life
/// of the entry.
pub struct ProcessEntry {
    pub id: String,
    pub pid: Option<u32>,
    child: Child,
}

impl ProcessEntry {
    pub fn new(id: String, child: Child) -> Self {
        Self {
            id,
            pid: child.id(),
            child,
        }
    }
}

/// Registry of background processes for one conversation session.
#[derive(Default)]
pub struct ProcessRegistry {
    entries: DashMap<String, ProcessEntry>,
    next_id: AtomicU64,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next process identifier.
    ///
    /// Counter-based, not size-based: removals must not cause reuse.
    pub fn next_process_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("process_{}", n)
    }

    /// Register a process that is still running after its timeout.
    pub fn insert(&self, entry: ProcessEntry) {
        debug!(id = %entry.id, pid = ?entry.pid, "Registered background process");
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers of all tracked processes.
    pub fn process_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Terminate a background process and remove it from the registry.
    ///
    /// Sends one termination signal to the child's process group; there is
    /// no graceful-then-forced escalation. An unknown identifier leaves
    /// the registry untouched.
    pub fn terminate(&self, id: &str) -> Result<(), ProcessError> {
        let (_, entry) = self
            .entries
            .remove(id)
            .ok_or_else(|| ProcessError::NotFound(id.to_string()))?;

        info!(id = %id, pid = ?entry.pid, "Stopping background process");
        signal_and_reap(entry);
        Ok(())
    }

    /// Session teardown: terminate every remaining entry.
    ///
    /// Returns the number of processes that were stopped.
    pub fn terminate_all(&self) -> usize {
        let ids = self.process_ids();
        let mut stopped = 0;
        for id in ids {
            if self.terminate(&id).is_ok() {
                stopped += 1;
            }
        }
        stopped
    }
}

/// Signal the child's process group, then reap it on a detached task.
#[cfg(unix)]
fn signal_and_reap(mut entry: ProcessEntry) {
    if let Some(pid) = entry.pid {
        // The child was started with setsid, so it leads its own process
        // group and pgid == pid. Signalling the group also reaches any
        // subprocesses it spawned.
        //
        // SAFETY: killpg with a pid obtained from Child::id() is safe; the
        // pid stays valid while the Child handle is alive.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGTERM);
        }
    }
    tokio::spawn(async move {
        let _ = entry.child.wait().await;
    });
}

#[cfg(not(unix))]
fn signal_and_reap(mut entry: ProcessEntry) {
    let _ = entry.child.start_kill();
    tokio::spawn(async move {
        let _ = entry.child.wait().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[cfg(unix)]
    fn spawn_sleep() -> Child {
        let mut cmd = tokio::process::Command::new("sleep");
        cmd.arg("30")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        // SAFETY: setsid in the forked child detaches it into its own
        // process group; no shared mutable state is touched.
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
        cmd.spawn().unwrap()
    }

    #[test]
    fn identifiers_are_monotonic() {
        let registry = ProcessRegistry::new();
        assert_eq!(registry.next_process_id(), "process_0");
        assert_eq!(registry.next_process_id(), "process_1");
        assert_eq!(registry.next_process_id(), "process_2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn identifiers_are_not_reused_after_termination() {
        let registry = ProcessRegistry::new();

        let first = registry.next_process_id();
        registry.insert(ProcessEntry::new(first.clone(), spawn_sleep()));
        registry.terminate(&first).unwrap();

        // Registry is empty again, but the next identifier must not repeat.
        assert!(registry.is_empty());
        let second = registry.next_process_id();
        assert_ne!(first, second);
        assert_eq!(second, "process_1");
    }

    #[test]
    fn terminate_unknown_id_is_not_found() {
        let registry = ProcessRegistry::new();
        let err = registry.terminate("process_9").unwrap_err();
        assert!(matches!(err, ProcessError::NotFound(id) if id == "process_9"));
        assert!(registry.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_removes_entry_and_kills_process() {
        let registry = ProcessRegistry::new();
        let id = registry.next_process_id();
        let child = spawn_sleep();
        let pid = child.id().unwrap();
        registry.insert(ProcessEntry::new(id.clone(), child));
        assert!(registry.contains(&id));

        registry.terminate(&id).unwrap();
        assert!(!registry.contains(&id));

        // The sleep child should be gone shortly after SIGTERM.
        let mut alive = true;
        for _ in 0..40 {
            // SAFETY: signal 0 only performs liveness/permission checks.
            let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
            if rc == -1 {
                alive = false;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!alive, "process {} still running after terminate", pid);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_all_empties_the_registry() {
        let registry = ProcessRegistry::new();
        for _ in 0..3 {
            let id = registry.next_process_id();
            registry.insert(ProcessEntry::new(id, spawn_sleep()));
        }
        assert_eq!(registry.len(), 3);

        let stopped = registry.terminate_all();
        assert_eq!(stopped, 3);
        assert!(registry.is_empty());
    }
}
