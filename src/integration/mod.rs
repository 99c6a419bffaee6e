//! This module fetches the external integration data, and tracks the state of the integration panel
//!
//! The calendar, task and mail reads run concurrently. A failing branch degrades to an empty result,
//! except when the calendar read reports an expired credential: the whole refresh then fails, so that the user is asked to reconnect.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use crate::config::IntegrationConfig;
use crate::error::{classify, IntegrationError};
use crate::external::{CalendarEvent, ExternalItem, MailThread, TimeWindow};
use crate::identity::AccessCredential;
use crate::traits::IntegrationSource;

pub mod progress;
use progress::{FeedbackSender, PanelState, RefreshProgress};


/// What the last successful refresh returned
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegrationData {
    pub events: Vec<CalendarEvent>,
    pub tasks: Vec<ExternalItem>,
    pub mail: Vec<MailThread>,
    pub fetched_at: Option<DateTime<Utc>>,
}


/// Fetch every branch of the integration with `credential`.
///
/// Calendar events are fetched for the window starting at the beginning of the local day of `now`.
pub async fn fetch_all<S>(source: &S, credential: &AccessCredential, config: &IntegrationConfig, now: DateTime<Utc>, progress: &mut RefreshProgress)
    -> Result<IntegrationData, IntegrationError>
where
    S: IntegrationSource + ?Sized,
{
    let window = TimeWindow::days_from(now.with_timezone(&Local), config.events_window_days);
    progress.debug(&format!("Refreshing the integration ({} to {})", window.start, window.end));

    let (events, tasks, mail) = tokio::join!(
        source.fetch_events(credential, &window, config.max_events),
        source.fetch_tasks(credential, config.max_tasks),
        source.fetch_mail(credential, config.max_mail_threads),
    );

    let mut events_error = None;
    let events = match events {
        Ok(events) => Some(events),
        Err(failure) => match classify(&failure) {
            IntegrationError::ExpiredCredential => {
                progress.error(&format!("The calendar rejected the credential: {}", failure));
                return Err(IntegrationError::ExpiredCredential);
            },
            IntegrationError::Failed(msg) => {
                progress.degraded(&format!("Unable to fetch calendar events: {}", failure));
                events_error = Some(msg);
                None
            },
        },
    };

    let tasks = match tasks {
        Ok(tasks) => Some(tasks),
        Err(failure) => {
            progress.degraded(&format!("Unable to fetch external tasks: {}", failure));
            None
        },
    };

    if events.is_none() && tasks.is_none() {
        let msg = events_error.unwrap_or_else(|| "Unable to reach the integration".to_string());
        return Err(IntegrationError::Failed(msg));
    }

    let mail = match mail {
        Ok(mail) => mail,
        Err(failure) => {
            progress.degraded(&format!("Unable to fetch mail: {}", failure));
            Vec::new()
        },
    };

    let data = IntegrationData {
        events: events.unwrap_or_default(),
        tasks: tasks.unwrap_or_default(),
        mail,
        fetched_at: Some(now),
    };
    progress.info(&format!("Integration refreshed: {} events, {} tasks, {} mail threads ({} branch(es) degraded)",
        data.events.len(), data.tasks.len(), data.mail.len(), progress.n_degraded()));
    Ok(data)
}


/// Identifies a refresh that has been started with [`IntegrationPanel::begin_refresh`]
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshTicket {
    generation: u64,
    credential: AccessCredential,
}

impl RefreshTicket {
    pub fn credential(&self) -> &AccessCredential {
        &self.credential
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}


/// The integration panel: its state, and the data of the last successful refresh.
///
/// Data is kept while a refresh is loading or after it failed, so that the panel keeps showing something.
pub struct IntegrationPanel<S: ?Sized> {
    source: Arc<S>,
    config: IntegrationConfig,
    state: PanelState,
    data: IntegrationData,
    generation: u64,
    active_credential: Option<AccessCredential>,
    feedback_channel: Option<FeedbackSender>,
}

impl<S> IntegrationPanel<S>
where
    S: IntegrationSource + ?Sized,
{
    pub fn new(source: Arc<S>, config: IntegrationConfig) -> Self {
        Self {
            source, config,
            state: PanelState::Idle,
            data: IntegrationData::default(),
            generation: 0,
            active_credential: None,
            feedback_channel: None,
        }
    }

    /// Publish every state change on `channel`
    pub fn new_with_feedback_channel(source: Arc<S>, config: IntegrationConfig, channel: FeedbackSender) -> Self {
        let mut panel = Self::new(source, config);
        panel.feedback_channel = Some(channel);
        panel
    }

    pub fn source(&self) -> &Arc<S>                 { &self.source }
    pub fn config(&self) -> &IntegrationConfig      { &self.config }
    pub fn state(&self) -> &PanelState              { &self.state  }
    pub fn data(&self) -> &IntegrationData          { &self.data   }
    pub fn is_loading(&self) -> bool                { self.state.is_loading() }
    pub fn error_message(&self) -> Option<String>   { self.state.error_message() }

    fn set_state(&mut self, state: PanelState) {
        log::debug!("Integration panel: {} -> {}", self.state, state);
        self.state = state;
        if let Some(sender) = &self.feedback_channel {
            let _ = sender.send(self.state.clone());
        }
    }

    /// Start a refresh with `credential`, and move to `Loading`.
    ///
    /// Returns `None` if a refresh with the same credential is already in flight: such duplicate triggers are ignored.
    /// A refresh with another credential supersedes the one in flight, whose result will be discarded.
    pub fn begin_refresh(&mut self, credential: &AccessCredential) -> Option<RefreshTicket> {
        if self.is_loading() && self.active_credential.as_ref() == Some(credential) {
            log::debug!("A refresh is already in flight, ignoring this one");
            return None;
        }

        self.generation += 1;
        self.active_credential = Some(credential.clone());
        self.set_state(PanelState::Loading);
        Some(RefreshTicket { generation: self.generation, credential: credential.clone() })
    }

    /// Apply the result of the refresh identified by `ticket`.
    ///
    /// Returns `false` (and changes nothing) if the refresh has been superseded, or if the panel has been reset since.
    pub fn apply(&mut self, ticket: RefreshTicket, result: Result<IntegrationData, IntegrationError>) -> bool {
        if ticket.generation != self.generation {
            log::debug!("Discarding the result of a stale refresh (generation {}, current is {})", ticket.generation, self.generation);
            return false;
        }

        match result {
            Ok(data) => {
                self.data = data;
                self.set_state(PanelState::Ready);
            },
            Err(IntegrationError::ExpiredCredential) => self.set_state(PanelState::Expired),
            Err(IntegrationError::Failed(msg)) => self.set_state(PanelState::Failed(msg)),
        }
        true
    }

    /// Refresh with `credential` and apply the result.
    ///
    /// Returns `Ok(false)` if the call was ignored because a refresh is already in flight.
    pub async fn refresh(&mut self, credential: &AccessCredential) -> Result<bool, IntegrationError> {
        let ticket = match self.begin_refresh(credential) {
            None => return Ok(false),
            Some(ticket) => ticket,
        };

        let mut progress = RefreshProgress::new();
        let result = fetch_all(&*self.source, ticket.credential(), &self.config, Utc::now(), &mut progress).await;
        let outcome = result.clone().map(|_| true);
        self.apply(ticket, result);
        outcome
    }

    /// Forget everything (e.g. on sign-out). Any refresh in flight will be discarded.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.active_credential = None;
        self.data = IntegrationData::default();
        self.set_state(PanelState::Idle);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiFailure;
    use crate::external::ExternalStatus;
    use crate::mock_source::MockSource;

    fn cred(token: &str) -> AccessCredential {
        AccessCredential::new(token)
    }

    fn some_data() -> IntegrationData {
        IntegrationData {
            tasks: vec![ExternalItem::new("e1", "External", ExternalStatus::NeedsAction)],
            ..IntegrationData::default()
        }
    }

    #[tokio::test]
    async fn calendar_failure_does_not_suppress_tasks() {
        let source = MockSource::new();
        source.set_events(Err(ApiFailure::from_response(500, "boom")));
        source.set_tasks(Ok(some_data().tasks));
        source.set_mail(Err(ApiFailure::from_response(401, "")));

        let mut progress = RefreshProgress::new();
        let data = fetch_all(&source, &cred("t"), &IntegrationConfig::default(), Utc::now(), &mut progress).await.unwrap();
        assert!(data.events.is_empty());
        assert_eq!(data.tasks.len(), 1);
        assert!(data.mail.is_empty());
        assert_eq!(progress.n_degraded(), 2);
    }

    #[tokio::test]
    async fn expired_calendar_credential_fails_the_refresh() {
        let source = MockSource::new();
        source.set_events(Err(ApiFailure::from_response(401, r#"{"error":{"message":"invalid_token"}}"#)));

        let mut progress = RefreshProgress::new();
        let result = fetch_all(&source, &cred("t"), &IntegrationConfig::default(), Utc::now(), &mut progress).await;
        assert_eq!(result, Err(IntegrationError::ExpiredCredential));
    }

    #[tokio::test]
    async fn expired_task_credential_degrades_silently() {
        let source = MockSource::new();
        source.set_tasks(Err(ApiFailure::from_response(401, "")));

        let mut progress = RefreshProgress::new();
        let data = fetch_all(&source, &cred("t"), &IntegrationConfig::default(), Utc::now(), &mut progress).await.unwrap();
        assert!(data.tasks.is_empty());
        assert!(progress.is_complete() == false);
    }

    #[tokio::test]
    async fn both_primary_branches_failing_fails_the_refresh() {
        let source = MockSource::new();
        source.set_events(Err(ApiFailure::from_response(503, "Calendar unavailable")));
        source.set_tasks(Err(ApiFailure::from_response(503, "Tasks unavailable")));

        let mut progress = RefreshProgress::new();
        let result = fetch_all(&source, &cred("t"), &IntegrationConfig::default(), Utc::now(), &mut progress).await;
        assert_eq!(result, Err(IntegrationError::Failed("Calendar unavailable".to_string())));
    }

    #[tokio::test]
    async fn requests_use_the_configured_window_and_limits() {
        let source = MockSource::new();
        let now: DateTime<Utc> = "2026-05-04T18:00:00Z".parse().unwrap();
        let mut progress = RefreshProgress::new();
        fetch_all(&source, &cred("t"), &IntegrationConfig::default(), now, &mut progress).await.unwrap();

        let calls = source.calls();
        assert_eq!(calls.events_windows, vec![TimeWindow::days_from(now.with_timezone(&Local), 7)]);
        assert_eq!(calls.events_max, vec![20]);
        assert_eq!(calls.tasks_max, vec![50]);
    }

    #[test]
    fn duplicate_triggers_are_ignored() {
        let mut panel = IntegrationPanel::new(Arc::new(MockSource::new()), IntegrationConfig::default());
        let ticket = panel.begin_refresh(&cred("a")).unwrap();
        assert!(panel.begin_refresh(&cred("a")).is_none());
        assert!(panel.apply(ticket, Ok(some_data())));
        assert_eq!(panel.state(), &PanelState::Ready);
        assert!(panel.begin_refresh(&cred("a")).is_some());
    }

    #[test]
    fn superseded_refreshes_are_discarded() {
        let mut panel = IntegrationPanel::new(Arc::new(MockSource::new()), IntegrationConfig::default());
        let old = panel.begin_refresh(&cred("old")).unwrap();
        let new = panel.begin_refresh(&cred("new")).unwrap();

        assert!(panel.apply(old, Ok(some_data())) == false);
        assert!(panel.is_loading());
        assert!(panel.data().tasks.is_empty());

        assert!(panel.apply(new, Err(IntegrationError::Failed("nope".into()))));
        assert_eq!(panel.error_message(), Some("nope".to_string()));
    }

    #[test]
    fn results_are_discarded_after_a_reset() {
        let mut panel = IntegrationPanel::new(Arc::new(MockSource::new()), IntegrationConfig::default());
        let ticket = panel.begin_refresh(&cred("a")).unwrap();
        panel.reset();
        assert!(panel.apply(ticket, Ok(some_data())) == false);
        assert_eq!(panel.state(), &PanelState::Idle);
        assert_eq!(panel.data(), &IntegrationData::default());
    }

    #[tokio::test]
    async fn expiry_keeps_previous_data_and_feeds_back() {
        let source = Arc::new(MockSource::new());
        source.set_tasks(Ok(some_data().tasks));
        let (sender, mut receiver) = progress::feedback_channel();
        let mut panel = IntegrationPanel::new_with_feedback_channel(source.clone(), IntegrationConfig::default(), sender);

        assert_eq!(panel.refresh(&cred("a")).await, Ok(true));
        assert_eq!(*receiver.borrow_and_update(), PanelState::Ready);

        source.set_events(Err(ApiFailure::from_response(401, "")));
        assert_eq!(panel.refresh(&cred("a")).await, Err(IntegrationError::ExpiredCredential));
        assert!(panel.state().needs_reconnect());
        assert!(panel.is_loading() == false);
        assert_eq!(panel.data().tasks.len(), 1);
        assert_eq!(*receiver.borrow_and_update(), PanelState::Expired);
    }
}
