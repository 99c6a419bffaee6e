//! Read-only items fetched from the external integration

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::task::TaskStatus;

/// The status of an external task item, as reported by the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExternalStatus {
    NeedsAction,
    Completed,
    /// Anything this crate does not know about
    #[serde(other)]
    Unknown,
}

impl ExternalStatus {
    /// The board column of such an item. The external source has no "in progress" state.
    pub fn board_status(&self) -> TaskStatus {
        match self {
            ExternalStatus::Completed => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }
}

/// A task item owned by the external provider.
///
/// This crate never mutates or deletes it: the provider is the source of truth, and any local change would be lost at the next refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: ExternalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,
}

impl ExternalItem {
    pub fn new<S: ToString, T: ToString>(id: S, title: T, status: ExternalStatus) -> Self {
        Self { id: id.to_string(), title: title.to_string(), notes: None, status, completed: None }
    }
}


/// When a calendar event starts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventStart {
    /// A timed event
    DateTime(DateTime<Utc>),
    /// An all-day event
    Date(NaiveDate),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: Option<EventStart>,
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, Some(EventStart::Date(_)))
    }
}


/// A recent inbox thread
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MailThread {
    pub id: String,
    pub snippet: String,
    pub subject: String,
    pub from: String,
}


/// The time range calendar events are fetched for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// From the start of the day of `now`, in the time zone of `now`, through `days` days later
    pub fn days_from<Tz: TimeZone>(now: DateTime<Tz>, days: i64) -> Self {
        let zone = now.timezone();
        let start = now.date_naive().and_hms_opt(0, 0, 0)
            .and_then(|midnight| zone.from_local_datetime(&midnight).earliest())
            .map(|midnight| midnight.with_timezone(&Utc))
            // There is no midnight on days a DST change skips it
            .unwrap_or_else(|| now.with_timezone(&Utc));
        Self { start, end: start + Duration::days(days) }
    }
}
