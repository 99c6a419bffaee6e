//! Support for library configuration options

use once_cell::sync::Lazy;
use url::Url;

/// Base URL of the Google Calendar API
pub static DEFAULT_CALENDAR_API: Lazy<Url> = Lazy::new(|| parse_builtin("https://www.googleapis.com/calendar/v3/"));
/// Base URL of the Google Tasks API
pub static DEFAULT_TASKS_API: Lazy<Url> = Lazy::new(|| parse_builtin("https://tasks.googleapis.com/tasks/v1/"));
/// Base URL of the Gmail API
pub static DEFAULT_GMAIL_API: Lazy<Url> = Lazy::new(|| parse_builtin("https://gmail.googleapis.com/gmail/v1/"));

/// How many days of calendar events are fetched, starting today
pub const EVENTS_WINDOW_DAYS: i64 = 7;
/// At most this many calendar events are fetched
pub const MAX_EVENTS: u32 = 20;
/// At most this many external tasks are fetched
pub const MAX_TASKS: u32 = 50;
/// At most this many inbox threads are fetched
pub const MAX_MAIL_THREADS: u32 = 5;

fn parse_builtin(url: &str) -> Url {
    Url::parse(url).unwrap(/* built-in URLs are valid */)
}


/// Where and how much the integration fetches
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationConfig {
    pub calendar_api: Url,
    pub tasks_api: Url,
    pub gmail_api: Url,
    pub events_window_days: i64,
    pub max_events: u32,
    pub max_tasks: u32,
    pub max_mail_threads: u32,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            calendar_api: DEFAULT_CALENDAR_API.clone(),
            tasks_api: DEFAULT_TASKS_API.clone(),
            gmail_api: DEFAULT_GMAIL_API.clone(),
            events_window_days: EVENTS_WINDOW_DAYS,
            max_events: MAX_EVENTS,
            max_tasks: MAX_TASKS,
            max_mail_threads: MAX_MAIL_THREADS,
        }
    }
}

impl IntegrationConfig {
    /// Point every API at the same server (e.g. a mock server in tests).
    pub fn with_base_url(base: &Url) -> Self {
        Self {
            calendar_api: base.clone(),
            tasks_api: base.clone(),
            gmail_api: base.clone(),
            ..Self::default()
        }
    }

    /// The default settings, with the base URLs overridden by the `TASKBOARD_CALENDAR_API`,
    /// `TASKBOARD_TASKS_API` and `TASKBOARD_GMAIL_API` environment variables when they are set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        override_from_env(&mut config.calendar_api, "TASKBOARD_CALENDAR_API");
        override_from_env(&mut config.tasks_api, "TASKBOARD_TASKS_API");
        override_from_env(&mut config.gmail_api, "TASKBOARD_GMAIL_API");
        config
    }
}

fn override_from_env(target: &mut Url, var: &str) {
    let value = match std::env::var(var) {
        Err(_) => return,
        Ok(value) => value,
    };
    match Url::parse(&value) {
        Ok(url) => *target = url,
        Err(err) => log::warn!("Ignoring {}={:?}: {}", var, value, err),
    }
}
