//! Tests of the Google read API client, against a mock HTTP server

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskboard::client::GoogleClient;
use taskboard::config::IntegrationConfig;
use taskboard::error::{classify, IntegrationError};
use taskboard::external::{EventStart, ExternalStatus, TimeWindow};
use taskboard::identity::AccessCredential;
use taskboard::integration::progress::PanelState;
use taskboard::integration::IntegrationPanel;
use taskboard::traits::IntegrationSource;

async fn client_for(server: &MockServer) -> GoogleClient {
    let _ = env_logger::builder().is_test(true).try_init();
    let base = Url::parse(&server.uri()).unwrap();
    GoogleClient::new(IntegrationConfig::with_base_url(&base))
}

fn credential() -> AccessCredential {
    AccessCredential::new("ya29.test-token")
}


#[tokio::test]
async fn test_events() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer ya29.test-token"))
        .and(query_param("timeMin", "2026-03-10T00:00:00Z"))
        .and(query_param("timeMax", "2026-03-17T00:00:00Z"))
        .and(query_param("maxResults", "20"))
        .and(query_param("orderBy", "startTime"))
        .and(query_param("singleEvents", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "calendar#events",
            "items": [
                {"id": "ev1", "summary": "Standup", "start": {"dateTime": "2026-03-10T09:30:00Z"}},
                {"id": "ev2", "summary": "Offsite", "start": {"date": "2026-03-12"}, "description": "Bring a laptop"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap();
    let window = TimeWindow::days_from(now, 7);
    let events = client.fetch_events(&credential(), &window, 20).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].summary, "Standup");
    assert_eq!(events[0].start, Some(EventStart::DateTime(Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap())));
    assert!(events[1].is_all_day());
    assert_eq!(events[1].description.as_deref(), Some("Bring a laptop"));
}

#[tokio::test]
async fn test_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/@default/tasks"))
        .and(query_param("showCompleted", "true"))
        .and(query_param("maxResults", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "t1", "title": "Call the bank", "status": "needsAction", "etag": "\"abc\""},
                {"id": "t2", "title": "Renew passport", "status": "completed", "completed": "2026-03-01T10:00:00.000Z"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let tasks = client.fetch_tasks(&credential(), 50).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].status, ExternalStatus::NeedsAction);
    assert_eq!(tasks[1].status, ExternalStatus::Completed);
    assert!(tasks[1].completed.is_some());
}

#[tokio::test]
async fn test_mail_skips_unreadable_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .and(query_param("q", "label:inbox"))
        .and(query_param("maxResults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "m1", "threadId": "th1"}, {"id": "m2", "threadId": "th2"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m1",
            "snippet": "See you tomorrow",
            "payload": {"headers": [
                {"name": "From", "value": "Ana <ana@example.com>"},
                {"name": "Subject", "value": "Lunch"}
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/m2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mail = client.fetch_mail(&credential(), 5).await.unwrap();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].subject, "Lunch");
    assert_eq!(mail[0].from, "Ana <ana@example.com>");
}

#[tokio::test]
async fn test_unauthorized_means_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "invalid_token", "status": "UNAUTHENTICATED"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let window = TimeWindow::days_from(Utc::now(), 7);
    let failure = client.fetch_events(&credential(), &window, 20).await.unwrap_err();
    assert_eq!(failure.status, Some(401));
    assert_eq!(failure.message, "invalid_token");
    assert_eq!(classify(&failure), IntegrationError::ExpiredCredential);
}

#[tokio::test]
async fn test_panel_degrades_a_failing_calendar() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "Backend Error"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lists/@default/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "t1", "title": "Call the bank", "status": "needsAction"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let config = client.config().clone();
    let mut panel = IntegrationPanel::new(Arc::new(client), config);
    assert_eq!(panel.refresh(&credential()).await, Ok(true));
    assert_eq!(panel.state(), &PanelState::Ready);
    assert!(panel.data().events.is_empty());
    assert_eq!(panel.data().tasks.len(), 1);
    assert!(panel.data().mail.is_empty());
}
