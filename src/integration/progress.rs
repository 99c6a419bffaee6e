//! Utilities to track the state of the integration panel

use std::fmt::{Display, Error, Formatter};

/// The state of the integration panel
#[derive(Clone, Debug, PartialEq)]
pub enum PanelState {
    /// No credential, or the panel is not displayed
    Idle,
    /// A refresh is in flight
    Loading,
    /// The last refresh succeeded
    Ready,
    /// The provider rejected the credential: the user should reconnect
    Expired,
    /// The last refresh failed
    Failed(String),
}

impl PanelState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    /// Whether the "reconnect" action should be offered
    pub fn needs_reconnect(&self) -> bool {
        matches!(self, PanelState::Expired)
    }

    /// The text to display inline, if any
    pub fn error_message(&self) -> Option<String> {
        match self {
            PanelState::Expired => Some("Your Google session has expired. Reconnect to see your calendar and tasks.".to_string()),
            PanelState::Failed(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

impl Display for PanelState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            PanelState::Idle => write!(f, "Not connected"),
            PanelState::Loading => write!(f, "Loading..."),
            PanelState::Ready => write!(f, "Up to date"),
            PanelState::Expired => write!(f, "Credential expired"),
            PanelState::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self::Idle
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<PanelState>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<PanelState>;

/// Create a feeback channel, that can be used to follow the state of the integration panel
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(PanelState::default())
}




/// A structure that tracks the branches that degraded during a refresh
#[derive(Debug, Default)]
pub struct RefreshProgress {
    n_degraded: u32,
}
impl RefreshProgress {
    pub fn new() -> Self {
        Self { n_degraded: 0 }
    }

    /// Whether every branch of the refresh succeeded
    pub fn is_complete(&self) -> bool {
        self.n_degraded == 0
    }

    pub fn n_degraded(&self) -> u32 {
        self.n_degraded
    }

    /// Log a branch that fell back to an empty result
    pub fn degraded(&mut self, text: &str) {
        log::warn!("{}", text);
        self.n_degraded += 1;
    }
    /// Log an error
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
    }
    /// Log an info
    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }
    /// Log a debug message
    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }
}
