//! This module provides a client for the read-only Google Calendar, Tasks and Gmail APIs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::IntegrationConfig;
use crate::error::ApiFailure;
use crate::external::{CalendarEvent, EventStart, ExternalItem, MailThread, TimeWindow};
use crate::identity::AccessCredential;
use crate::traits::IntegrationSource;


/// An integration source that fetches its data from Google APIs
#[derive(Clone, Debug)]
pub struct GoogleClient {
    http: reqwest::Client,
    config: IntegrationConfig,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start: Option<RawEventTime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEventTime {
    #[serde(default)]
    date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct TaskList {
    #[serde(default)]
    items: Vec<ExternalItem>,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Deserialize)]
struct RawMessage {
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Option<RawPayload>,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    headers: Vec<RawHeader>,
}

#[derive(Deserialize)]
struct RawHeader {
    name: String,
    value: String,
}

impl From<RawEvent> for CalendarEvent {
    fn from(raw: RawEvent) -> Self {
        let start = raw.start.and_then(|time| match (time.date_time, time.date) {
            (Some(date_time), _) => Some(EventStart::DateTime(date_time)),
            (None, Some(date)) => Some(EventStart::Date(date)),
            (None, None) => None,
        });
        Self {
            id: raw.id,
            summary: raw.summary.unwrap_or_default(),
            start,
            description: raw.description,
        }
    }
}

impl From<RawMessage> for MailThread {
    fn from(raw: RawMessage) -> Self {
        let headers = raw.payload.map(|p| p.headers).unwrap_or_default();
        let header = |name: &str| headers.iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone());
        Self {
            subject: header("Subject").unwrap_or_else(|| "No Subject".to_string()),
            from: header("From").unwrap_or_else(|| "Unknown".to_string()),
            id: raw.id,
            snippet: raw.snippet,
        }
    }
}

impl GoogleClient {
    /// Create a client. This does not start a connection
    pub fn new(config: IntegrationConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, credential: &AccessCredential, query: &[(&str, String)]) -> Result<T, ApiFailure> {
        log::debug!("GET {}", url);
        let response = self.http
            .get(url.clone())
            .bearer_auth(credential.token())
            .query(query)
            .send()
            .await
            .map_err(|err| ApiFailure::new(None, format!("Request to {} failed: {}", url, err)))?;

        let status = response.status();
        if status.is_success() == false {
            let body = response.text().await.unwrap_or_default();
            let failure = ApiFailure::from_response(status.as_u16(), &body);
            log::warn!("{} replied {}", url, failure);
            return Err(failure);
        }

        response.json::<T>().await
            .map_err(|err| ApiFailure::new(None, format!("Unable to parse the response of {}: {}", url, err)))
    }
}

/// Resolve `path` against `base`, whether or not `base` ends with a slash
fn endpoint(base: &Url, path: &str) -> Result<Url, ApiFailure> {
    let mut base = base.clone();
    if base.path().ends_with('/') == false {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path).map_err(|err| ApiFailure::new(None, format!("Invalid endpoint {}{}: {}", base, path, err)))
}

fn rfc3339(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl IntegrationSource for GoogleClient {
    async fn fetch_events(&self, credential: &AccessCredential, window: &TimeWindow, max_results: u32) -> Result<Vec<CalendarEvent>, ApiFailure> {
        let url = endpoint(&self.config.calendar_api, "calendars/primary/events")?;
        let query = [
            ("timeMin", rfc3339(&window.start)),
            ("timeMax", rfc3339(&window.end)),
            ("maxResults", max_results.to_string()),
            ("orderBy", "startTime".to_string()),
            ("singleEvents", "true".to_string()),
        ];
        let list: EventList = self.get_json(url, credential, &query).await?;
        Ok(list.items.into_iter().map(CalendarEvent::from).collect())
    }

    async fn fetch_tasks(&self, credential: &AccessCredential, max_results: u32) -> Result<Vec<ExternalItem>, ApiFailure> {
        let url = endpoint(&self.config.tasks_api, "lists/@default/tasks")?;
        let query = [
            ("showCompleted", "true".to_string()),
            ("maxResults", max_results.to_string()),
        ];
        let list: TaskList = self.get_json(url, credential, &query).await?;
        Ok(list.items)
    }

    async fn fetch_mail(&self, credential: &AccessCredential, max_results: u32) -> Result<Vec<MailThread>, ApiFailure> {
        let url = endpoint(&self.config.gmail_api, "users/me/messages")?;
        let query = [
            ("maxResults", max_results.to_string()),
            ("q", "label:inbox".to_string()),
        ];
        let list: MessageList = self.get_json(url, credential, &query).await?;

        let details = list.messages.iter().map(|msg| async move {
            let url = endpoint(&self.config.gmail_api, &format!("users/me/messages/{}", msg.id))?;
            self.get_json::<RawMessage>(url, credential, &[]).await
        });

        let mut threads = Vec::new();
        for (msg, detail) in list.messages.iter().zip(futures::future::join_all(details).await) {
            match detail {
                Ok(raw) => threads.push(MailThread::from(raw)),
                Err(err) => log::warn!("Failed to fetch message {}: {}", msg.id, err),
            }
        }
        Ok(threads)
    }
}
