//! The authenticated session: who is signed in, and which integration credential they granted

use std::sync::Arc;

use crate::error::{ProviderError, SessionError};
use crate::identity::{AccessCredential, AuthProvider, Identity};
use crate::storage::LocalStorage;
use crate::traits::IdentityProvider;


/// The current identity and integration credential.
///
/// The credential is mirrored into the [`LocalStorage`], so that it survives reloads.
pub struct Session<P> {
    provider: Arc<P>,
    storage: Arc<LocalStorage>,
    identity: Option<Identity>,
    credential: Option<AccessCredential>,
}

impl<P> Session<P>
where
    P: IdentityProvider,
{
    /// Create an unauthenticated session. The credential stored in `storage` is picked up once its owner signs in again.
    pub fn new(provider: Arc<P>, storage: Arc<LocalStorage>) -> Self {
        Self { provider, storage, identity: None, credential: None }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn credential(&self) -> Option<&AccessCredential> {
        self.credential.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Pick up an identity that is still signed in at the provider (e.g. after a reload)
    pub async fn restore(&mut self) -> Result<Option<&Identity>, SessionError> {
        match self.provider.current_identity().await.map_err(provider_error)? {
            Some(identity) => self.adopt(identity, None),
            None => {
                self.identity = None;
                self.credential = None;
            },
        }
        Ok(self.identity.as_ref())
    }

    /// Run the interactive sign-in flow of `provider`.
    ///
    /// Returns `Ok(None)` in case the user dismissed the flow: this is not an error, and the session remains unauthenticated.
    pub async fn sign_in(&mut self, provider: AuthProvider) -> Result<Option<&Identity>, SessionError> {
        let outcome = match self.provider.sign_in_interactive(provider, provider.scopes()).await {
            Ok(outcome) => outcome,
            Err(ProviderError::Cancelled) => {
                log::info!("{} sign-in cancelled by the user", provider);
                return Ok(None);
            },
            Err(err) => {
                log::error!("{} sign-in error: {}", provider, err);
                return Err(provider_error(err));
            },
        };

        log::info!("Signed in as {} with {}", outcome.identity.display_name(), provider);
        self.adopt(outcome.identity, outcome.credential);
        Ok(self.identity.as_ref())
    }

    /// Re-run the Google consent flow to obtain a fresh integration credential.
    ///
    /// Returns `Ok(None)` if the user cancelled, or if the provider did not grant a credential.
    pub async fn reconnect_integration(&mut self) -> Result<Option<&AccessCredential>, SessionError> {
        let provider = AuthProvider::Google;
        let outcome = match self.provider.sign_in_interactive(provider, provider.scopes()).await {
            Ok(outcome) => outcome,
            Err(ProviderError::Cancelled) => {
                log::info!("Reconnection cancelled by the user");
                return Ok(None);
            },
            Err(err) => return Err(provider_error(err)),
        };

        if let Some(previous) = &self.identity {
            if previous.owner_key() != outcome.identity.owner_key() {
                log::info!("Reconnection signed in {} instead of {}", outcome.identity.display_name(), previous.display_name());
            }
        }
        let granted = outcome.credential.is_some();
        self.adopt(outcome.identity, outcome.credential);
        if granted == false {
            log::warn!("Reconnection did not grant any integration credential");
            return Ok(None);
        }
        Ok(self.credential.as_ref())
    }

    /// Make `identity` the current one.
    ///
    /// A newly granted credential is persisted. Otherwise the stored credential is kept only if it was granted to this very identity.
    fn adopt(&mut self, identity: Identity, granted: Option<AccessCredential>) {
        let owner = identity.owner_key();
        match granted {
            Some(credential) => {
                self.storage.set_credential(owner, &credential);
                self.credential = Some(credential);
            },
            None => {
                if self.storage.has_foreign_credential(owner) {
                    log::info!("Forgetting the integration credential of another identity");
                    self.storage.clear_credential();
                }
                self.credential = self.storage.credential_for(owner);
            },
        }
        self.identity = Some(identity);
    }

    /// Sign out. This always succeeds from the caller's perspective: a provider failure is only logged.
    pub async fn sign_out(&mut self) {
        self.identity = None;
        self.credential = None;
        self.storage.clear_credential();
        if let Err(err) = self.provider.sign_out().await {
            log::warn!("Identity provider sign-out failed: {}", err);
        }
    }
}

fn provider_error(err: ProviderError) -> SessionError {
    SessionError::Provider(err.to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DevIdentityProvider, OwnerKey};
    use crate::mock_behaviour::MockBehaviour;

    fn session_with_credential() -> (Session<DevIdentityProvider>, Arc<DevIdentityProvider>, Arc<LocalStorage>) {
        let provider = Arc::new(DevIdentityProvider::with_identity(
            Identity::new(OwnerKey::from("alice"), "Alice"),
            Some(AccessCredential::new("alice-token")),
        ));
        let storage = Arc::new(LocalStorage::in_memory());
        (Session::new(provider.clone(), storage.clone()), provider, storage)
    }

    #[tokio::test]
    async fn google_sign_in_stores_and_persists_the_credential() {
        let (mut session, _provider, storage) = session_with_credential();
        let identity = session.sign_in(AuthProvider::Google).await.unwrap().cloned();
        assert_eq!(identity.unwrap().owner_key(), &OwnerKey::from("alice"));
        assert_eq!(session.credential(), Some(&AccessCredential::new("alice-token")));
        assert_eq!(storage.credential_for(&OwnerKey::from("alice")), Some(AccessCredential::new("alice-token")));
    }

    #[tokio::test]
    async fn cancellation_leaves_the_session_unauthenticated() {
        let (mut session, provider, _storage) = session_with_credential();
        provider.cancel_next_sign_in();
        assert_eq!(session.sign_in(AuthProvider::Google).await, Ok(None));
        assert!(session.is_signed_in() == false);
        assert!(session.credential().is_none());
    }

    #[tokio::test]
    async fn provider_errors_are_surfaced() {
        let (mut session, provider, _storage) = session_with_credential();
        provider.set_behaviour(MockBehaviour { sign_in_behaviour: (0, 1), ..MockBehaviour::default() });
        assert!(matches!(session.sign_in(AuthProvider::Facebook).await, Err(SessionError::Provider(_))));
        assert!(session.is_signed_in() == false);
    }

    #[tokio::test]
    async fn sign_out_clears_everything_even_if_the_provider_fails() {
        let (mut session, provider, storage) = session_with_credential();
        session.sign_in(AuthProvider::Google).await.unwrap();
        provider.set_behaviour(MockBehaviour { sign_out_behaviour: (0, 1), ..MockBehaviour::default() });

        session.sign_out().await;
        assert!(session.identity().is_none());
        assert!(session.credential().is_none());
        assert!(storage.credential_for(&OwnerKey::from("alice")).is_none());
    }

    #[tokio::test]
    async fn credential_survives_a_reload() {
        let (mut session, provider, storage) = session_with_credential();
        session.sign_in(AuthProvider::Google).await.unwrap();

        let mut reloaded = Session::new(provider, storage);
        assert!(reloaded.credential().is_none());
        let restored = reloaded.restore().await.unwrap().cloned();
        assert_eq!(restored.map(|id| id.display_name().to_string()), Some("Alice".to_string()));
        assert_eq!(reloaded.credential(), Some(&AccessCredential::new("alice-token")));
    }

    #[tokio::test]
    async fn stored_credential_needs_a_signed_in_identity() {
        let provider = Arc::new(DevIdentityProvider::new());
        let storage = Arc::new(LocalStorage::in_memory());
        storage.set_credential(&OwnerKey::from("mock-user-123"), &AccessCredential::new("stale-token"));

        let mut session = Session::new(provider, storage);
        assert_eq!(session.restore().await, Ok(None));
        assert!(session.credential().is_none());
    }

    #[tokio::test]
    async fn credential_of_another_identity_is_dropped() {
        let (mut alice_session, _provider, storage) = session_with_credential();
        alice_session.sign_in(AuthProvider::Google).await.unwrap();

        // Bob signs in on the same client, with a provider that grants no credential
        let bob = Arc::new(DevIdentityProvider::with_identity(Identity::new(OwnerKey::from("bob"), "Bob"), None));
        let mut bob_session = Session::new(bob, storage.clone());
        bob_session.sign_in(AuthProvider::Facebook).await.unwrap();
        assert!(bob_session.credential().is_none());
        assert!(storage.credential_for(&OwnerKey::from("alice")).is_none());
    }

    #[tokio::test]
    async fn same_identity_keeps_its_credential_without_scopes() {
        let (mut session, provider, storage) = session_with_credential();
        session.sign_in(AuthProvider::Google).await.unwrap();

        let mut again = Session::new(provider, storage);
        again.sign_in(AuthProvider::Facebook).await.unwrap();
        assert_eq!(again.credential(), Some(&AccessCredential::new("alice-token")));
    }
}
