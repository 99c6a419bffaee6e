//! An in-process integration source, whose replies are scripted by tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ApiFailure;
use crate::external::{CalendarEvent, ExternalItem, MailThread, TimeWindow};
use crate::identity::AccessCredential;
use crate::traits::IntegrationSource;


/// What a [`MockSource`] has been asked so far
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceCalls {
    pub credentials: Vec<AccessCredential>,
    pub events_windows: Vec<TimeWindow>,
    pub events_max: Vec<u32>,
    pub tasks_max: Vec<u32>,
    pub mail_max: Vec<u32>,
}

impl SourceCalls {
    /// How many refreshes reached this source
    pub fn n_refreshes(&self) -> usize {
        self.events_max.len()
    }
}

/// An integration source that replies with whatever it has been told to.
///
/// Every branch replies with an empty list until it is scripted otherwise.
#[derive(Debug)]
pub struct MockSource {
    events: Mutex<Result<Vec<CalendarEvent>, ApiFailure>>,
    tasks: Mutex<Result<Vec<ExternalItem>, ApiFailure>>,
    mail: Mutex<Result<Vec<MailThread>, ApiFailure>>,
    calls: Mutex<SourceCalls>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Ok(Vec::new())),
            tasks: Mutex::new(Ok(Vec::new())),
            mail: Mutex::new(Ok(Vec::new())),
            calls: Mutex::new(SourceCalls::default()),
        }
    }

    pub fn set_events(&self, reply: Result<Vec<CalendarEvent>, ApiFailure>) {
        *self.events.lock().unwrap() = reply;
    }

    pub fn set_tasks(&self, reply: Result<Vec<ExternalItem>, ApiFailure>) {
        *self.tasks.lock().unwrap() = reply;
    }

    pub fn set_mail(&self, reply: Result<Vec<MailThread>, ApiFailure>) {
        *self.mail.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> SourceCalls {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationSource for MockSource {
    async fn fetch_events(&self, credential: &AccessCredential, window: &TimeWindow, max_results: u32) -> Result<Vec<CalendarEvent>, ApiFailure> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.credentials.push(credential.clone());
            calls.events_windows.push(window.clone());
            calls.events_max.push(max_results);
        }
        self.events.lock().unwrap().clone()
    }

    async fn fetch_tasks(&self, _credential: &AccessCredential, max_results: u32) -> Result<Vec<ExternalItem>, ApiFailure> {
        self.calls.lock().unwrap().tasks_max.push(max_results);
        self.tasks.lock().unwrap().clone()
    }

    async fn fetch_mail(&self, _credential: &AccessCredential, max_results: u32) -> Result<Vec<MailThread>, ApiFailure> {
        self.calls.lock().unwrap().mail_max.push(max_results);
        self.mail.lock().unwrap().clone()
    }
}
