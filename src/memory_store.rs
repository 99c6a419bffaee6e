//! An in-process document store.
//!
//! It behaves like the remote task collection (full snapshots pushed to every watcher of the changed owner),
//! and its failures can be tweaked with a [`MockBehaviour`].

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::error::StoreError;
use crate::identity::OwnerKey;
use crate::mock_behaviour::MockBehaviour;
use crate::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::traits::{DocumentStore, SnapshotReceiver};


/// A document store that keeps its records in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
}

#[derive(Debug, Default)]
struct MemoryData {
    /// Records, in insertion order
    records: Vec<Task>,
    watchers: Vec<Watcher>,
    behaviour: MockBehaviour,
}

#[derive(Debug)]
struct Watcher {
    owner: OwnerKey,
    sender: UnboundedSender<Vec<Task>>,
}

impl MemoryData {
    fn snapshot_of(&self, owner: &OwnerKey) -> Vec<Task> {
        self.records.iter()
            .filter(|task| task.owner_key() == owner)
            .cloned()
            .collect()
    }

    /// Push a new snapshot to every live watcher of `owner`, and forget the closed ones
    fn notify(&mut self, owner: &OwnerKey) {
        self.watchers.retain(|w| w.sender.is_closed() == false);
        let snapshot = self.snapshot_of(owner);
        for watcher in self.watchers.iter().filter(|w| &w.owner == owner) {
            if watcher.sender.send(snapshot.clone()).is_err() {
                log::debug!("A watcher of {} went away", owner);
            }
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the failure injection settings
    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.data.lock().unwrap().behaviour = behaviour;
    }

    /// Write a full record, as another device or another owner would do
    pub fn put_record(&self, task: Task) {
        let mut data = self.data.lock().unwrap();
        let owner = task.owner_key().clone();
        match data.records.iter().position(|t| t.id() == task.id()) {
            Some(position) => data.records[position] = task,
            None => data.records.push(task),
        }
        data.notify(&owner);
    }

    /// Every record, whatever its owner
    pub fn records(&self) -> Vec<Task> {
        self.data.lock().unwrap().records.clone()
    }

    /// How many watchers are still listening
    pub fn live_watchers(&self) -> usize {
        self.data.lock().unwrap().watchers.iter()
            .filter(|w| w.sender.is_closed() == false)
            .count()
    }
}

fn rejected(err: Box<dyn std::error::Error>) -> StoreError {
    StoreError::Rejected(err.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn watch(&self, owner: &OwnerKey) -> Result<SnapshotReceiver, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.behaviour.can_watch().map_err(rejected)?;

        let (sender, receiver) = unbounded_channel();
        let _ = sender.send(data.snapshot_of(owner));
        data.watchers.push(Watcher { owner: owner.clone(), sender });
        log::debug!("Memory store: watching tasks of {}", owner);
        Ok(receiver)
    }

    async fn insert(&self, draft: TaskDraft) -> Result<TaskId, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.behaviour.can_insert().map_err(rejected)?;

        let id = TaskId::random();
        let owner = draft.owner_key.clone();
        data.records.push(Task::from_draft(id.clone(), draft));
        data.notify(&owner);
        Ok(id)
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.behaviour.can_update().map_err(rejected)?;

        let owner = match data.records.iter_mut().find(|t| t.id() == id) {
            None => return Err(StoreError::Missing(id.clone())),
            Some(task) => {
                task.apply(&patch);
                task.owner_key().clone()
            },
        };
        data.notify(&owner);
        Ok(())
    }

    async fn remove(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.behaviour.can_remove().map_err(rejected)?;

        let position = match data.records.iter().position(|t| t.id() == id) {
            None => return Err(StoreError::Missing(id.clone())),
            Some(position) => position,
        };
        let removed = data.records.remove(position);
        data.notify(removed.owner_key());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, TaskStatus};

    fn draft(title: &str, owner: &str) -> TaskDraft {
        TaskDraft::stamped(NewTask::new(title, ""), OwnerKey::from(owner))
    }

    #[tokio::test]
    async fn watchers_only_receive_their_owner_snapshots() {
        let store = MemoryStore::new();
        let mut alice = store.watch(&OwnerKey::from("alice")).await.unwrap();
        let mut bob = store.watch(&OwnerKey::from("bob")).await.unwrap();
        assert_eq!(alice.recv().await.unwrap(), Vec::new());
        assert_eq!(bob.recv().await.unwrap(), Vec::new());

        store.insert(draft("Alice's", "alice")).await.unwrap();
        let snapshot = alice.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].title(), "Alice's");
        assert!(bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn updates_and_removals_are_echoed() {
        let store = MemoryStore::new();
        let owner = OwnerKey::from("alice");
        let id = store.insert(draft("One", "alice")).await.unwrap();
        let mut rx = store.watch(&owner).await.unwrap();
        rx.recv().await.unwrap();

        store.update(&id, TaskPatch::status(TaskStatus::Done)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap()[0].status(), TaskStatus::Done);

        store.remove(&id).await.unwrap();
        assert!(rx.recv().await.unwrap().is_empty());
        assert_eq!(store.remove(&id).await, Err(StoreError::Missing(id.clone())));
        assert_eq!(store.update(&id, TaskPatch::default()).await, Err(StoreError::Missing(id)));
    }

    #[tokio::test]
    async fn closed_watchers_are_forgotten() {
        let store = MemoryStore::new();
        let rx = store.watch(&OwnerKey::from("alice")).await.unwrap();
        assert_eq!(store.live_watchers(), 1);
        drop(rx);
        assert_eq!(store.live_watchers(), 0);
        store.insert(draft("One", "alice")).await.unwrap();
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn rejected_writes_leave_records_untouched() {
        let store = MemoryStore::new();
        store.set_behaviour(MockBehaviour { insert_behaviour: (0, 1), ..MockBehaviour::default() });
        assert!(matches!(store.insert(draft("One", "alice")).await, Err(StoreError::Rejected(_))));
        assert!(store.records().is_empty());
    }
}
