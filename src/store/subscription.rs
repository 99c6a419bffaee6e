//! Live subscriptions to an owner's task documents

use std::sync::Mutex;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::identity::OwnerKey;
use crate::task::Task;
use crate::traits::SnapshotReceiver;


/// See [`snapshot_channel`]
pub(crate) type SnapshotSender = watch::Sender<Vec<Task>>;
/// A receiver of the task snapshots of the current owner. It holds an empty list when nobody is signed in.
pub type SnapshotWatcher = watch::Receiver<Vec<Task>>;

/// Create the channel the current snapshot is published on
pub(crate) fn snapshot_channel() -> (SnapshotSender, SnapshotWatcher) {
    watch::channel(Vec::new())
}


/// The published snapshot, and the generation of the only subscription allowed to write it.
///
/// Both live under the same lock, so that once a subscription has been torn down, it cannot publish anything anymore.
#[derive(Debug)]
pub(crate) struct SharedSnapshot {
    generation: Mutex<u64>,
    sender: SnapshotSender,
}

impl SharedSnapshot {
    pub(crate) fn new() -> Self {
        let (sender, _) = snapshot_channel();
        Self { generation: Mutex::new(0), sender }
    }

    /// Start a new generation. Any older subscription is fenced off.
    pub(crate) fn next_generation(&self) -> u64 {
        let mut generation = self.generation.lock().unwrap();
        *generation += 1;
        *generation
    }

    /// Fence off every subscription, and clear the snapshot
    pub(crate) fn clear(&self) {
        let mut generation = self.generation.lock().unwrap();
        *generation += 1;
        self.sender.send_replace(Vec::new());
    }

    /// Publish `tasks`, unless `generation` has been fenced off. Returns whether it has been published.
    pub(crate) fn publish(&self, generation: u64, tasks: Vec<Task>) -> bool {
        let current = self.generation.lock().unwrap();
        if *current != generation {
            return false;
        }
        self.sender.send_replace(tasks);
        true
    }

    pub(crate) fn current(&self) -> Vec<Task> {
        self.sender.borrow().clone()
    }

    pub(crate) fn watcher(&self) -> SnapshotWatcher {
        self.sender.subscribe()
    }
}


/// The handle of a live subscription.
///
/// Dropping it (or calling [`Subscription::teardown`]) stops the delivery of snapshots.
#[derive(Debug)]
pub struct Subscription {
    owner: OwnerKey,
    forwarder: JoinHandle<()>,
}

impl Subscription {
    /// Forward the snapshots of `receiver` to `shared`, for as long as `generation` is current.
    ///
    /// Records that do not belong to `owner` are dropped.
    pub(crate) fn spawn(owner: OwnerKey, generation: u64, mut receiver: SnapshotReceiver, shared: Arc<SharedSnapshot>) -> Self {
        let filter = owner.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(records) = receiver.recv().await {
                let tasks = owned_by(&filter, records);
                if shared.publish(generation, tasks) == false {
                    break;
                }
            }
            log::debug!("Stopped forwarding the tasks of {}", filter);
        });

        Self { owner, forwarder }
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    /// Stop delivering snapshots
    pub fn teardown(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Keep the records of `owner` only
pub(crate) fn owned_by(owner: &OwnerKey, records: Vec<Task>) -> Vec<Task> {
    let total = records.len();
    let tasks: Vec<Task> = records.into_iter()
        .filter(|task| task.owner_key() == owner)
        .collect();
    if tasks.len() != total {
        log::warn!("Dropped {} task(s) not owned by {} from a snapshot", total - tasks.len(), owner);
    }
    tasks
}
