//! The board context: it ties the session, the task store and the integration panel together,
//! and exposes the commands a board front-end issues.

use std::sync::Arc;

use crate::config::IntegrationConfig;
use crate::error::{DashboardError, IntegrationError, TaskError};
use crate::fusion::{fuse, Board};
use crate::identity::{AuthProvider, Identity};
use crate::integration::IntegrationPanel;
use crate::integration::progress::PanelState;
use crate::item::FusedTask;
use crate::session::Session;
use crate::storage::{Language, LocalStorage};
use crate::store::TaskStore;
use crate::store::subscription::SnapshotWatcher;
use crate::task::{NewTask, TaskId, TaskStatus};
use crate::traits::{DocumentStore, IdentityProvider, IntegrationSource};


/// The views of the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    /// The columns, with the integration panel
    Dashboard,
    /// Charts only. No integration data is displayed here.
    Analytics,
}

impl View {
    pub fn shows_integration(&self) -> bool {
        matches!(self, View::Dashboard)
    }
}

impl Default for View {
    fn default() -> Self {
        View::Dashboard
    }
}


/// A board, for at most one signed-in identity at a time
pub struct Dashboard<P, D, S: ?Sized> {
    session: Session<P>,
    store: TaskStore<D>,
    panel: IntegrationPanel<S>,
    view: View,
    storage: Arc<LocalStorage>,
}

impl<P, D, S> Dashboard<P, D, S>
where
    P: IdentityProvider,
    D: DocumentStore + 'static,
    S: IntegrationSource + ?Sized,
{
    pub fn new(provider: Arc<P>, backend: Arc<D>, source: Arc<S>, config: IntegrationConfig, storage: Arc<LocalStorage>) -> Self {
        Self {
            session: Session::new(provider, storage.clone()),
            store: TaskStore::new(backend),
            panel: IntegrationPanel::new(source, config),
            view: View::default(),
            storage,
        }
    }

    /// Use an existing panel (e.g. one that publishes on a feedback channel)
    pub fn with_panel(mut self, panel: IntegrationPanel<S>) -> Self {
        self.panel = panel;
        self
    }

    pub fn session(&self) -> &Session<P>            { &self.session }
    pub fn store(&self) -> &TaskStore<D>            { &self.store   }
    pub fn panel(&self) -> &IntegrationPanel<S>     { &self.panel   }
    pub fn view(&self) -> View                      { self.view     }
    pub fn identity(&self) -> Option<&Identity>     { self.session.identity() }
    pub fn integration_state(&self) -> &PanelState  { self.panel.state() }

    /// A receiver notified on every new task snapshot
    pub fn changes(&self) -> SnapshotWatcher {
        self.store.changes()
    }

    /// Whether the integration should be fetched: somebody is signed in with a credential, and the current view displays integration data
    pub fn integration_active(&self) -> bool {
        self.session.is_signed_in() && self.session.credential().is_some() && self.view.shows_integration()
    }

    /// Pick up a session that survived a reload
    pub async fn restore(&mut self) -> Result<Option<Identity>, DashboardError> {
        let identity = match self.session.restore().await?.cloned() {
            None => return Ok(None),
            Some(identity) => identity,
        };
        self.follow(&identity).await?;
        Ok(Some(identity))
    }

    /// Sign in, then show the tasks of the new identity.
    ///
    /// Returns `Ok(None)` if the user dismissed the sign-in flow.
    pub async fn sign_in(&mut self, provider: AuthProvider) -> Result<Option<Identity>, DashboardError> {
        let identity = match self.session.sign_in(provider).await? {
            None => return Ok(None),
            Some(identity) => identity.clone(),
        };

        self.follow(&identity).await?;
        Ok(Some(identity))
    }

    /// Sign out. Tasks and integration data are cleared, and no refresh in flight will be applied.
    pub async fn sign_out(&mut self) {
        self.store.unsubscribe();
        self.panel.reset();
        self.session.sign_out().await;
        log::info!("Signed out");
    }

    pub async fn set_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        self.view = view;
        self.refresh_quietly().await;
    }

    /// Refresh the integration panel.
    ///
    /// Returns `Ok(false)` if nothing was fetched, because the integration is not active or because a refresh is already in flight.
    pub async fn refresh_integration(&mut self) -> Result<bool, IntegrationError> {
        let credential = match (self.integration_active(), self.session.credential()) {
            (true, Some(credential)) => credential.clone(),
            _ => {
                log::debug!("The integration is not active, not refreshing");
                return Ok(false);
            },
        };
        self.panel.refresh(&credential).await
    }

    /// Run the consent flow again to get a fresh credential (e.g. after it expired), then refresh.
    ///
    /// Returns `Ok(false)` if no new credential was obtained.
    pub async fn reconnect(&mut self) -> Result<bool, DashboardError> {
        if self.session.reconnect_integration().await?.is_none() {
            return Ok(false);
        }

        if let Some(identity) = self.session.identity().cloned() {
            self.follow(&identity).await?;
        }
        Ok(true)
    }

    /// Show the tasks and integration data of `identity`, which has just been signed in.
    ///
    /// Data of a previous owner is dropped. If the tasks cannot be subscribed to, the session is signed out again.
    async fn follow(&mut self, identity: &Identity) -> Result<(), DashboardError> {
        let owner = identity.owner_key();
        if self.store.owner() != Some(owner) {
            self.panel.reset();
            if let Err(err) = self.store.subscribe(owner.clone()).await {
                log::error!("Unable to show the tasks of {}, signing out: {}", owner, err);
                self.session.sign_out().await;
                return Err(err.into());
            }
        }
        self.refresh_quietly().await;
        Ok(())
    }

    async fn refresh_quietly(&mut self) {
        // Errors are reported by the panel state
        let _ = self.refresh_integration().await;
    }

    pub async fn create_task(&self, input: NewTask) -> Result<TaskId, TaskError> {
        self.store.create(input).await
    }

    /// Advance a board item along the status cycle. External items are read-only.
    pub async fn advance(&self, item: &FusedTask) -> Result<TaskStatus, TaskError> {
        let id = item.local_id().ok_or(TaskError::ReadOnly)?;
        self.store.advance_status(id).await
    }

    /// Delete a board item. External items are read-only.
    pub async fn delete(&self, item: &FusedTask) -> Result<(), TaskError> {
        let id = item.local_id().ok_or(TaskError::ReadOnly)?;
        self.store.delete(id).await
    }

    /// The current board: the task snapshot, merged with the external tasks of the last refresh
    pub fn board(&self) -> Board {
        fuse(&self.store.snapshot(), &self.panel.data().tasks)
    }

    pub fn language(&self) -> Language {
        self.storage.language()
    }

    pub fn set_language(&self, language: Language) {
        self.storage.set_language(language);
    }
}
