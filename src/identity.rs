//! Identities, credentials, and a development identity provider

use std::fmt::{Debug, Display, Formatter};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::mock_behaviour::MockBehaviour;
use crate::traits::IdentityProvider;

/// OAuth scope to read calendar events
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
/// OAuth scope to read task lists
pub const TASKS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/tasks.readonly";
/// OAuth scope to read mail
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// The scopes requested when signing in with a provider that grants integration access
pub const INTEGRATION_SCOPES: [&str; 3] = [CALENDAR_READONLY_SCOPE, TASKS_READONLY_SCOPE, GMAIL_READONLY_SCOPE];


/// The stable identifier of an identity. Persisted tasks are filtered by this key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerKey {
    content: String,
}

impl OwnerKey {
    pub fn as_str(&self) -> &str {
        &self.content
    }
}
impl From<String> for OwnerKey {
    fn from(content: String) -> Self {
        Self { content }
    }
}
impl From<&str> for OwnerKey {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}
impl Display for OwnerKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}


/// An authenticated identity. It does not change during a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    owner_key: OwnerKey,
    display_name: String,
    avatar: Option<String>,
    email: Option<String>,
}

impl Identity {
    pub fn new<S: ToString>(owner_key: OwnerKey, display_name: S) -> Self {
        Self { owner_key, display_name: display_name.to_string(), avatar: None, email: None }
    }

    pub fn with_avatar<S: ToString>(mut self, avatar: S) -> Self {
        self.avatar = Some(avatar.to_string());
        self
    }

    pub fn with_email<S: ToString>(mut self, email: S) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn owner_key(&self) -> &OwnerKey   { &self.owner_key    }
    pub fn display_name(&self) -> &str     { &self.display_name }
    pub fn avatar(&self) -> Option<&str>   { self.avatar.as_deref() }
    pub fn email(&self) -> Option<&str>    { self.email.as_deref()  }
}


/// A bearer token granting read-only access to the calendar, tasks and mail APIs.
///
/// It carries no expiry: the credential is considered expired when a provider rejects it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    token: String,
}

impl AccessCredential {
    pub fn new<S: ToString>(token: S) -> Self {
        Self { token: token.to_string() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Debug for AccessCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessCredential(<{} chars>)", self.token.len())
    }
}


/// The identity providers a user can sign in with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthProvider {
    /// Grants an integration credential
    Google,
    /// Identity only
    Facebook,
}

impl AuthProvider {
    /// The scopes to request from this provider
    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            AuthProvider::Google => &INTEGRATION_SCOPES,
            AuthProvider::Facebook => &[],
        }
    }
}

impl Display for AuthProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProvider::Google => write!(f, "Google"),
            AuthProvider::Facebook => write!(f, "Facebook"),
        }
    }
}


/// The result of a successful interactive sign-in
#[derive(Clone, Debug, PartialEq)]
pub struct SignInOutcome {
    pub identity: Identity,
    pub credential: Option<AccessCredential>,
}


/// An identity provider that signs in a fixed development user, without any network call.
///
/// This is what runs when no real provider is configured. Tests can make it fail or cancel through a [`MockBehaviour`].
#[derive(Debug)]
pub struct DevIdentityProvider {
    identity: Identity,
    credential: Option<AccessCredential>,
    state: Mutex<DevProviderState>,
}

#[derive(Debug, Default)]
struct DevProviderState {
    signed_in: Option<Identity>,
    behaviour: MockBehaviour,
    cancel_next: bool,
    next_outcome: Option<SignInOutcome>,
    sign_in_count: u32,
}

impl DevIdentityProvider {
    /// The default development user
    pub fn new() -> Self {
        let identity = Identity::new(OwnerKey::from("mock-user-123"), "Clemente (Dev Mode)")
            .with_email("clemente@example.com");
        Self::with_identity(identity, None)
    }

    /// A provider that signs in `identity` and grants `credential` on Google sign-ins
    pub fn with_identity(identity: Identity, credential: Option<AccessCredential>) -> Self {
        Self { identity, credential, state: Mutex::new(DevProviderState::default()) }
    }

    /// Grant `credential` on Google sign-ins
    pub fn granting(mut self, credential: AccessCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Simulate the user dismissing the next sign-in popup
    pub fn cancel_next_sign_in(&self) {
        self.state.lock().unwrap().cancel_next = true;
    }

    /// Simulate another user going through the next sign-in popup
    pub fn sign_in_next_as(&self, identity: Identity, credential: Option<AccessCredential>) {
        self.state.lock().unwrap().next_outcome = Some(SignInOutcome { identity, credential });
    }

    /// Replace the failure injection settings
    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.state.lock().unwrap().behaviour = behaviour;
    }

    /// How many interactive sign-ins went through
    pub fn sign_in_count(&self) -> u32 {
        self.state.lock().unwrap().sign_in_count
    }
}

impl Default for DevIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for DevIdentityProvider {
    async fn sign_in_interactive(&self, provider: AuthProvider, scopes: &[&str]) -> Result<SignInOutcome, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.cancel_next {
            state.cancel_next = false;
            return Err(ProviderError::Cancelled);
        }
        state.behaviour.can_sign_in().map_err(|err| ProviderError::Failed {
            code: "auth/internal-error".to_string(),
            message: err.to_string(),
        })?;

        let (identity, credential) = match state.next_outcome.take() {
            Some(outcome) => (outcome.identity, outcome.credential),
            None => (self.identity.clone(), self.credential.clone()),
        };
        log::debug!("Dev provider: signing in {} with {} ({} scopes)", identity.display_name(), provider, scopes.len());
        state.sign_in_count += 1;
        state.signed_in = Some(identity.clone());
        let credential = match scopes.is_empty() {
            true => None,
            false => credential,
        };
        Ok(SignInOutcome { identity, credential })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.behaviour.can_sign_out().map_err(|err| ProviderError::Failed {
            code: "auth/network-request-failed".to_string(),
            message: err.to_string(),
        })?;
        state.signed_in = None;
        Ok(())
    }

    async fn current_identity(&self) -> Result<Option<Identity>, ProviderError> {
        Ok(self.state.lock().unwrap().signed_in.clone())
    }
}
