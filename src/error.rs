//! Error kinds surfaced by this crate
//!
//! Backend errors (document store, identity provider, HTTP APIs) are translated into these
//! kinds at the boundary of each component, so that callers only ever deal with a closed set of cases.

use serde::Deserialize;
use thiserror::Error;

use crate::task::TaskId;

/// Errors returned by a [`DocumentStore`](crate::traits::DocumentStore) backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The targeted record does not exist (anymore)
    #[error("no record with id {0}")]
    Missing(TaskId),
    /// The backend refused the operation (permissions, network...)
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Errors returned by the [`TaskStore`](crate::store::TaskStore)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// The document store rejected a write. The task list stays consistent with the last good snapshot.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// The mutation targeted a task that is not in the current snapshot
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// No identity is currently subscribed
    #[error("no signed-in identity")]
    NotSignedIn,
    /// The input was refused before anything was written
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The item comes from a read-only external source
    #[error("external items are read-only")]
    ReadOnly,
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(id) => TaskError::NotFound(id),
            StoreError::Rejected(msg) => TaskError::Persistence(msg),
        }
    }
}

/// Errors returned by an [`IdentityProvider`](crate::traits::IdentityProvider)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The user dismissed the sign-in flow
    #[error("sign-in cancelled by the user")]
    Cancelled,
    /// Any other provider failure
    #[error("{message} ({code})")]
    Failed { code: String, message: String },
}

/// Errors returned by the [`Session`](crate::session::Session)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Errors returned by the [`Dashboard`](crate::dashboard::Dashboard) commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Errors surfaced by the integration panel
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    /// The provider rejected the bearer credential. The user should reconnect.
    #[error("the integration credential has expired")]
    ExpiredCredential,
    /// Any other failure, with the provider's message
    #[error("{0}")]
    Failed(String),
}

/// A raw failure of a read API call, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    /// The HTTP status, if a response was received at all
    pub status: Option<u16>,
    /// The provider's error message (or the transport error)
    pub message: String,
}

impl ApiFailure {
    pub fn new<S: ToString>(status: Option<u16>, message: S) -> Self {
        Self { status, message: message.to_string() }
    }

    /// Build a failure out of an HTTP status and the raw response body.
    ///
    /// Google APIs reply with `{"error": {"code": 401, "message": "..."}}`; other bodies are kept verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody { error: ErrorDetails }
        #[derive(Deserialize)]
        struct ErrorDetails { message: String }

        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.error.message,
            Err(_) if body.trim().is_empty() => format!("HTTP status {}", status),
            Err(_) => body.to_string(),
        };
        Self { status: Some(status), message }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Map a raw API failure to the error kind shown to the user.
///
/// A 401 status, or a provider message mentioning an invalid or expired credential, means the credential must be renewed.
pub fn classify(failure: &ApiFailure) -> IntegrationError {
    let message = failure.message.to_lowercase();
    if failure.status == Some(401) || message.contains("invalid") || message.contains("expired") {
        IntegrationError::ExpiredCredential
    } else {
        IntegrationError::Failed(failure.message.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_status_means_expired() {
        let failure = ApiFailure::from_response(401, r#"{"error":{"code":401,"message":"Request had invalid authentication credentials."}}"#);
        assert_eq!(failure.message, "Request had invalid authentication credentials.");
        assert_eq!(classify(&failure), IntegrationError::ExpiredCredential);

        let bare = ApiFailure::from_response(401, "");
        assert_eq!(classify(&bare), IntegrationError::ExpiredCredential);
    }

    #[test]
    fn message_mentioning_the_token_means_expired() {
        let failure = ApiFailure::from_response(400, r#"{"error":{"message":"invalid_token"}}"#);
        assert_eq!(classify(&failure), IntegrationError::ExpiredCredential);

        let failure = ApiFailure::new(None, "Token has EXPIRED");
        assert_eq!(classify(&failure), IntegrationError::ExpiredCredential);
    }

    #[test]
    fn other_failures_keep_the_provider_message() {
        let failure = ApiFailure::from_response(500, r#"{"error":{"code":500,"message":"Backend Error"}}"#);
        assert_eq!(classify(&failure), IntegrationError::Failed("Backend Error".to_string()));

        let failure = ApiFailure::from_response(503, "upstream unavailable");
        assert_eq!(classify(&failure), IntegrationError::Failed("upstream unavailable".to_string()));

        let failure = ApiFailure::from_response(404, "  ");
        assert_eq!(failure.message, "HTTP status 404");
    }

    #[test]
    fn store_errors_translate_to_task_errors() {
        let id = TaskId::from("abc");
        assert_eq!(TaskError::from(StoreError::Missing(id.clone())), TaskError::NotFound(id));
        assert_eq!(TaskError::from(StoreError::Rejected("denied".into())), TaskError::Persistence("denied".into()));
    }
}
