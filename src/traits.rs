//! The collaborators this crate consumes.
//!
//! Each of them can be backed by a real service, or by an in-process implementation
//! (see [`MemoryStore`](crate::memory_store::MemoryStore) and [`DevIdentityProvider`](crate::identity::DevIdentityProvider)).

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{ApiFailure, ProviderError, StoreError};
use crate::external::{CalendarEvent, ExternalItem, MailThread, TimeWindow};
use crate::identity::{AccessCredential, AuthProvider, Identity, OwnerKey, SignInOutcome};
use crate::task::{Task, TaskDraft, TaskId, TaskPatch};

/// A stream of full snapshots of an owner's tasks.
///
/// Dropping the receiver ends the watch.
pub type SnapshotReceiver = UnboundedReceiver<Vec<Task>>;

/// The remote collection of task documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Watch the documents whose owner key is `owner`.
    ///
    /// The current snapshot is delivered right away, then a new full snapshot is delivered on every change.
    async fn watch(&self, owner: &OwnerKey) -> Result<SnapshotReceiver, StoreError>;
    /// Insert a new document, and return the id the store assigned to it
    async fn insert(&self, draft: TaskDraft) -> Result<TaskId, StoreError>;
    /// Patch an existing document
    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), StoreError>;
    /// Remove a document
    async fn remove(&self, id: &TaskId) -> Result<(), StoreError>;
}

/// An external authentication service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive (popup/redirect) sign-in flow, requesting `scopes`
    async fn sign_in_interactive(&self, provider: AuthProvider, scopes: &[&str]) -> Result<SignInOutcome, ProviderError>;
    /// Sign the current identity out
    async fn sign_out(&self) -> Result<(), ProviderError>;
    /// Returns the identity that is currently signed in, if any (e.g. after a reload)
    async fn current_identity(&self) -> Result<Option<Identity>, ProviderError>;
}

/// Read-only calendar, task and mail APIs
#[async_trait]
pub trait IntegrationSource: Send + Sync {
    /// Calendar events starting within `window`, ordered by start time
    async fn fetch_events(&self, credential: &AccessCredential, window: &TimeWindow, max_results: u32) -> Result<Vec<CalendarEvent>, ApiFailure>;
    /// External task items, including completed ones
    async fn fetch_tasks(&self, credential: &AccessCredential, max_results: u32) -> Result<Vec<ExternalItem>, ApiFailure>;
    /// The most recent inbox threads
    async fn fetch_mail(&self, credential: &AccessCredential, max_results: u32) -> Result<Vec<MailThread>, ApiFailure>;
}
