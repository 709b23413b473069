//! Task source - observable store of task list snapshots
//!
//! Built on a `tokio::sync::watch` channel: the channel always holds the
//! full current list, a new subscriber sees it immediately, and slow
//! subscribers only ever observe the latest snapshot.

use super::task::{Task, TaskFile, TaskFileError, TaskId};
use anyhow::Result;
use std::path::Path;
use thiserror::Error;
use tokio::sync::watch;

/// The task source has been dropped; no further snapshots will arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task source closed")]
pub struct SourceClosed;

/// Anything that can hand out snapshot subscriptions
pub trait TaskSource {
    fn subscribe(&self) -> Subscription;
}

/// Live subscription to a task source. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Vec<Task>>,
}

impl Subscription {
    pub fn new(mut rx: watch::Receiver<Vec<Task>>) -> Self {
        // Deliver the current list on first poll
        rx.mark_changed();
        Self { rx }
    }

    /// Non-blocking poll: the latest unseen snapshot, if any
    ///
    /// A snapshot sent right before the source closed is still delivered;
    /// `SourceClosed` is only reported once nothing is left unseen.
    pub fn try_next(&mut self) -> Result<Option<Vec<Task>>, SourceClosed> {
        let closed = self.rx.has_changed().is_err();
        let pending = self.rx.borrow().has_changed();

        if pending {
            Ok(Some(self.rx.borrow_and_update().clone()))
        } else if closed {
            Err(SourceClosed)
        } else {
            Ok(None)
        }
    }

    /// Wait for the next snapshot; `None` once the source is gone
    pub async fn next(&mut self) -> Option<Vec<Task>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// In-process task service
#[derive(Debug)]
pub struct TaskStore {
    tx: watch::Sender<Vec<Task>>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        let (tx, _rx) = watch::channel(tasks);
        Self { tx }
    }

    pub fn from_file(path: &Path) -> Result<Self, TaskFileError> {
        let file = TaskFile::from_file(path)?;
        log::info!("Loaded {} tasks from {}", file.tasks.len(), path.display());
        Ok(Self::new(file.tasks))
    }

    /// Current snapshot
    pub fn tasks(&self) -> Vec<Task> {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tx.borrow().iter().find(|t| t.id == id).cloned()
    }

    /// Replace the whole list and notify subscribers
    pub fn replace_all(&self, tasks: Vec<Task>) {
        self.tx.send_replace(tasks);
    }

    /// Append a task, assigning the next free id. Returns the new id.
    pub fn add_task(&self, mut task: Task) -> TaskId {
        let mut assigned = task.id;
        self.tx.send_modify(|tasks| {
            let next = tasks.iter().map(|t| t.id.get()).max().unwrap_or(0) + 1;
            assigned = TaskId(next);
            task.id = assigned;
            tasks.push(task);
        });
        assigned
    }

    /// Apply `f` to the task with `id`
    pub fn update_task(&self, id: TaskId, f: impl FnOnce(&mut Task)) -> Result<()> {
        let found = self.tx.send_if_modified(|tasks| match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        });

        if !found {
            anyhow::bail!("Task {} not found", id);
        }
        Ok(())
    }

    pub fn remove_task(&self, id: TaskId) -> Result<Task> {
        let mut removed = None;
        self.tx.send_if_modified(|tasks| match tasks.iter().position(|t| t.id == id) {
            Some(index) => {
                removed = Some(tasks.remove(index));
                true
            }
            None => false,
        });

        removed.ok_or_else(|| anyhow::anyhow!("Task {} not found", id))
    }
}

impl TaskSource for TaskStore {
    fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: u64, name: &str) -> Task {
        let day = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        Task::new(id, name, day, day)
    }

    #[test]
    fn test_subscriber_sees_current_list_first() {
        let store = TaskStore::new(vec![task(1, "A")]);
        let mut sub = store.subscribe();

        let first = sub.try_next().unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(sub.try_next().unwrap(), None);
    }

    #[test]
    fn test_changes_are_delivered_latest_only() {
        let store = TaskStore::new(Vec::new());
        let mut sub = store.subscribe();
        sub.try_next().unwrap();

        store.add_task(task(0, "A"));
        store.add_task(task(0, "B"));

        let latest = sub.try_next().unwrap().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(sub.try_next().unwrap(), None);
    }

    #[test]
    fn test_resubscribe_restarts_from_current() {
        let store = TaskStore::new(vec![task(1, "A")]);
        let mut first = store.subscribe();
        first.try_next().unwrap();
        drop(first);

        store.add_task(task(0, "B"));
        let mut second = store.subscribe();
        assert_eq!(second.try_next().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_add_assigns_next_id() {
        let store = TaskStore::new(vec![task(4, "A"), task(2, "B")]);
        assert_eq!(store.add_task(task(0, "C")), TaskId(5));
        assert_eq!(store.get(TaskId(5)).unwrap().name, "C");

        let empty = TaskStore::new(Vec::new());
        assert_eq!(empty.add_task(task(0, "X")), TaskId(1));
    }

    #[test]
    fn test_update_and_remove() {
        let store = TaskStore::new(vec![task(1, "A"), task(2, "B")]);
        let mut sub = store.subscribe();
        sub.try_next().unwrap();

        store.update_task(TaskId(2), |t| t.progress = 0.25).unwrap();
        assert_eq!(sub.try_next().unwrap().unwrap()[1].progress, 0.25);

        assert!(store.update_task(TaskId(9), |t| t.progress = 1.0).is_err());
        assert_eq!(sub.try_next().unwrap(), None);

        let removed = store.remove_task(TaskId(1)).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(store.len(), 1);
        assert!(store.remove_task(TaskId(1)).is_err());
    }

    #[test]
    fn test_closed_source() {
        let store = TaskStore::new(vec![task(1, "A")]);
        let mut sub = store.subscribe();
        sub.try_next().unwrap();
        drop(store);
        assert_eq!(sub.try_next(), Err(SourceClosed));
    }

    #[test]
    fn test_last_snapshot_survives_close() {
        let store = TaskStore::new(vec![task(1, "A")]);
        let mut sub = store.subscribe();
        sub.try_next().unwrap();

        store.add_task(task(0, "B"));
        drop(store);

        assert_eq!(sub.try_next().unwrap().unwrap().len(), 2);
        assert_eq!(sub.try_next(), Err(SourceClosed));
    }

    #[test]
    fn test_async_next() {
        tokio_test::block_on(async {
            let store = TaskStore::new(vec![task(1, "A")]);
            let mut sub = store.subscribe();
            assert_eq!(sub.next().await.unwrap().len(), 1);

            store.replace_all(Vec::new());
            assert!(sub.next().await.unwrap().is_empty());

            drop(store);
            assert!(sub.next().await.is_none());
        });
    }
}
