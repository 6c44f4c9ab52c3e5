//! Registry of periodic background tasks.
//!
//! One task per `(guild, panel kind)` panel refresher, plus the process-wide
//! ticket sweep. Starting a task for a key that already has one aborts the old
//! task first. The map lock is only held for map operations, never across an
//! await.

use crate::core::panel::PanelKind;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Identifies a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Refresher of one guild's panel
    Panel(u64, PanelKind),
    /// Stale ticket and expired lock sweep
    Sweep,
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panel(guild_id, kind) => write!(f, "{kind} panel of {guild_id}"),
            Self::Sweep => f.write_str("ticket sweep"),
        }
    }
}

/// Owns the `JoinHandle` of every running background task.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<TaskKey, JoinHandle<()>>>,
}

impl TaskRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskKey, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns `task` under `key`, aborting any task already registered there.
    ///
    /// Returns whether a previous task was replaced.
    pub fn start<F>(&self, key: TaskKey, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.replace(key, tokio::spawn(task))
    }

    /// Registers an already spawned task, aborting the previous one.
    pub fn replace(&self, key: TaskKey, handle: JoinHandle<()>) -> bool {
        let previous = self.lock().insert(key, handle);
        previous.is_some_and(|old| {
            old.abort();
            tracing::debug!(task = %key, "Replaced background task");
            true
        })
    }

    /// Aborts and forgets the task under `key`. Returns whether one existed.
    pub fn stop(&self, key: TaskKey) -> bool {
        let removed = self.lock().remove(&key);
        removed.is_some_and(|handle| {
            handle.abort();
            tracing::debug!(task = %key, "Stopped background task");
            true
        })
    }

    /// Whether a live task is registered under `key`.
    ///
    /// Tasks that ended on their own (failed panel edit) count as not running.
    #[must_use]
    pub fn is_running(&self, key: TaskKey) -> bool {
        self.lock().get(&key).is_some_and(|h| !h.is_finished())
    }

    /// Aborts every task. Returns how many were registered.
    pub fn stop_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        let count = drained.len();
        for (_, handle) in drained {
            handle.abort();
        }
        count
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    const KEY: TaskKey = TaskKey::Panel(1, PanelKind::Live);

    /// A task that never finishes and drops `tx` when it is cancelled.
    fn pending(tx: oneshot::Sender<()>) -> impl Future<Output = ()> + Send + 'static {
        async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        }
    }

    async fn cancelled(rx: oneshot::Receiver<()>) -> bool {
        matches!(
            tokio::time::timeout(Duration::from_secs(1), rx).await,
            Ok(Err(_))
        )
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let registry = TaskRegistry::new();
        let (tx, rx) = oneshot::channel();

        assert!(!registry.start(KEY, pending(tx)));
        assert!(registry.is_running(KEY));
        assert!(!registry.is_running(TaskKey::Panel(1, PanelKind::Profiles)));
        assert!(!registry.is_running(TaskKey::Sweep));

        assert!(registry.stop(KEY));
        assert!(!registry.is_running(KEY));
        assert!(cancelled(rx).await);
        assert!(!registry.stop(KEY));
    }

    #[tokio::test]
    async fn test_start_replaces_previous_task() {
        let registry = TaskRegistry::new();
        let (tx1, rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();

        registry.start(KEY, pending(tx1));
        assert!(registry.start(KEY, pending(tx2)));
        assert!(cancelled(rx1).await);
        assert!(registry.is_running(KEY));
    }

    #[tokio::test]
    async fn test_finished_task_is_not_running() {
        let registry = TaskRegistry::new();
        registry.start(KEY, async {});
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!registry.is_running(KEY));
    }

    #[tokio::test]
    async fn test_stop_all() {
        let registry = TaskRegistry::new();
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        registry.start(TaskKey::Panel(1, PanelKind::Live), pending(tx1));
        registry.start(TaskKey::Sweep, pending(tx2));

        assert_eq!(registry.stop_all(), 2);
        assert!(cancelled(rx1).await);
        assert!(cancelled(rx2).await);
    }
}
