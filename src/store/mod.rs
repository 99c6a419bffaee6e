//! This module owns the tasks of the signed-in identity.
//!
//! The visible tasks are always the last snapshot delivered by the document store: mutations are written
//! to the store only, and become visible once the store echoes them.

use std::sync::Arc;

use crate::error::{StoreError, TaskError};
use crate::identity::OwnerKey;
use crate::task::{NewTask, Task, TaskDraft, TaskId, TaskPatch, TaskStatus};
use crate::traits::DocumentStore;

pub mod subscription;
use subscription::{SharedSnapshot, Subscription, SnapshotWatcher};


/// The task store of a client
pub struct TaskStore<D> {
    backend: Arc<D>,
    subscription: Option<Subscription>,
    shared: Arc<SharedSnapshot>,
}

impl<D> TaskStore<D>
where
    D: DocumentStore + 'static,
{
    pub fn new(backend: Arc<D>) -> Self {
        Self {
            backend,
            subscription: None,
            shared: Arc::new(SharedSnapshot::new()),
        }
    }

    pub fn backend(&self) -> &Arc<D> {
        &self.backend
    }

    /// The owner whose tasks are currently subscribed to
    pub fn owner(&self) -> Option<&OwnerKey> {
        self.subscription.as_ref().map(|sub| sub.owner())
    }

    /// The last snapshot (empty when nobody is subscribed)
    pub fn snapshot(&self) -> Vec<Task> {
        self.shared.current()
    }

    /// A receiver that is notified of every new snapshot
    pub fn changes(&self) -> SnapshotWatcher {
        self.shared.watcher()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.shared.current().iter().any(|task| task.id() == id)
    }

    /// Subscribe to the tasks of `owner`. The previous subscription (if any) is torn down first.
    ///
    /// This returns once the initial snapshot has been published.
    pub async fn subscribe(&mut self, owner: OwnerKey) -> Result<SnapshotWatcher, TaskError> {
        self.unsubscribe();

        let mut receiver = self.backend.watch(&owner).await.map_err(|err| {
            log::error!("Unable to watch the tasks of {}: {}", owner, err);
            TaskError::from(err)
        })?;

        let generation = self.shared.next_generation();
        if let Some(initial) = receiver.recv().await {
            self.shared.publish(generation, subscription::owned_by(&owner, initial));
        }

        log::info!("Subscribed to the tasks of {}", owner);
        let subscription = Subscription::spawn(owner, generation, receiver, self.shared.clone());
        self.subscription = Some(subscription);
        Ok(self.shared.watcher())
    }

    /// Tear down the current subscription and clear the snapshot.
    /// No snapshot is published after this returns.
    pub fn unsubscribe(&mut self) {
        self.shared.clear();
        if let Some(subscription) = self.subscription.take() {
            log::info!("Unsubscribed from the tasks of {}", subscription.owner());
            subscription.teardown();
        }
    }

    /// Create a task for the subscribed owner. It is visible once the store echoes it.
    pub async fn create(&self, input: NewTask) -> Result<TaskId, TaskError> {
        let owner = self.owner().cloned().ok_or(TaskError::NotSignedIn)?;
        if input.title.trim().is_empty() {
            return Err(TaskError::InvalidInput("a task needs a title".to_string()));
        }

        let draft = TaskDraft::stamped(input, owner);
        let id = self.backend.insert(draft).await.map_err(|err| {
            log::error!("Unable to create a task: {}", err);
            TaskError::from(err)
        })?;
        log::debug!("Created task {}", id);
        Ok(id)
    }

    /// Move a task to the next status of the `todo → in_progress → done → todo` cycle.
    ///
    /// Returns the requested status. The visible status changes once the store echoes it.
    pub async fn advance_status(&self, id: &TaskId) -> Result<TaskStatus, TaskError> {
        let current = match self.shared.current().iter().find(|task| task.id() == id) {
            None => {
                log::warn!("Cannot advance task {}: it is not in the current snapshot", id);
                return Err(TaskError::NotFound(id.clone()));
            },
            Some(task) => task.status(),
        };

        let next = current.next();
        self.backend.update(id, TaskPatch::status(next)).await.map_err(|err| {
            log::error!("Unable to advance task {}: {}", id, err);
            TaskError::from(err)
        })?;
        log::debug!("Task {}: {} -> {}", id, current, next);
        Ok(next)
    }

    /// Delete a task. Deleting a task that is already gone is not an error.
    pub async fn delete(&self, id: &TaskId) -> Result<(), TaskError> {
        if self.contains(id) == false {
            log::info!("Task {} is not in the current snapshot, nothing to delete", id);
            return Ok(());
        }

        match self.backend.remove(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::Missing(_)) => {
                log::info!("Task {} was already deleted", id);
                Ok(())
            },
            Err(err) => {
                log::error!("Unable to delete task {}: {}", id, err);
                Err(TaskError::from(err))
            },
        }
    }
}

impl<D> Drop for TaskStore<D> {
    fn drop(&mut self) {
        self.shared.clear();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::mock_behaviour::MockBehaviour;

    async fn next_snapshot(watcher: &mut SnapshotWatcher) -> Vec<Task> {
        tokio::time::timeout(std::time::Duration::from_secs(5), watcher.changed())
            .await
            .expect("no snapshot delivered")
            .expect("snapshot channel closed");
        let snapshot = watcher.borrow().clone();
        snapshot
    }

    #[tokio::test]
    async fn created_tasks_appear_once_echoed() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = TaskStore::new(backend.clone());
        let mut watcher = store.subscribe(OwnerKey::from("alice")).await.unwrap();
        assert!(store.snapshot().is_empty());

        let id = store.create(NewTask::new("Buy milk", "")).await.unwrap();
        let snapshot = next_snapshot(&mut watcher).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), &id);
        assert_eq!(snapshot[0].owner_key(), &OwnerKey::from("alice"));
    }

    #[tokio::test]
    async fn create_requires_an_owner_and_a_title() {
        let mut store = TaskStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.create(NewTask::new("x", "")).await, Err(TaskError::NotSignedIn));

        store.subscribe(OwnerKey::from("alice")).await.unwrap();
        assert!(matches!(store.create(NewTask::new("   ", "")).await, Err(TaskError::InvalidInput(_))));
        assert!(store.backend().records().is_empty());
    }

    #[tokio::test]
    async fn rejected_writes_are_persistence_errors() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = TaskStore::new(backend.clone());
        store.subscribe(OwnerKey::from("alice")).await.unwrap();

        backend.set_behaviour(MockBehaviour { insert_behaviour: (0, 1), ..MockBehaviour::default() });
        assert!(matches!(store.create(NewTask::new("x", "")).await, Err(TaskError::Persistence(_))));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn advancing_an_unknown_task_fails() {
        let mut store = TaskStore::new(Arc::new(MemoryStore::new()));
        store.subscribe(OwnerKey::from("alice")).await.unwrap();
        let id = TaskId::from("nope");
        assert_eq!(store.advance_status(&id).await, Err(TaskError::NotFound(id)));
    }

    #[tokio::test]
    async fn status_cycles_back_after_three_advances() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = TaskStore::new(backend.clone());
        let mut watcher = store.subscribe(OwnerKey::from("alice")).await.unwrap();
        let id = store.create(NewTask::new("Cycle", "")).await.unwrap();
        next_snapshot(&mut watcher).await;

        let mut seen = Vec::new();
        for _ in 0..3 {
            let requested = store.advance_status(&id).await.unwrap();
            let snapshot = next_snapshot(&mut watcher).await;
            assert_eq!(snapshot[0].status(), requested);
            seen.push(requested);
        }
        assert_eq!(seen, vec![TaskStatus::InProgress, TaskStatus::Done, TaskStatus::Todo]);
    }

    #[tokio::test]
    async fn unsubscribe_clears_and_stops_delivery() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = TaskStore::new(backend.clone());
        let mut watcher = store.subscribe(OwnerKey::from("alice")).await.unwrap();
        store.create(NewTask::new("One", "")).await.unwrap();
        next_snapshot(&mut watcher).await;

        store.unsubscribe();
        assert!(store.snapshot().is_empty());
        assert!(store.owner().is_none());

        backend.put_record(Task::from_draft(
            TaskId::from("late"),
            TaskDraft::stamped(NewTask::new("Late", ""), OwnerKey::from("alice")),
        ));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(store.snapshot().is_empty());
        assert_eq!(backend.live_watchers(), 0);
    }
}
