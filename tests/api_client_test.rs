//! REST client tests against an in-process HTTP server.
//!
//! Each test starts a one-shot server on `127.0.0.1:0`, makes a single call
//! and checks both what went over the wire and what the client returned.

mod common;

use common::{closed_url, TestServer};
use reminders_cli::api::{ApiClient, ApiError, ReminderBackend};
use serde_json::{json, Value};
use std::time::Duration;

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn create_posts_json_body_and_returns_response() {
    let server = TestServer::respond(201, r#"{"id":"abc"}"#);
    let client = ApiClient::new(&server.url).unwrap();

    let body = client
        .create("tea", "kettle is on", Duration::from_secs(600))
        .unwrap();

    assert_eq!(body, br#"{"id":"abc"}"#);
    let req = server.request();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/reminders");
    let sent: Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(
        sent,
        json!({
            "id": "",
            "title": "tea",
            "message": "kettle is on",
            "duration": 600_000_000_000i64,
        })
    );
}

#[test]
fn create_with_unexpected_status_keeps_both_codes_and_body() {
    let server = TestServer::respond(400, r#"{"error":"title required"}"#);
    let client = ApiClient::new(&server.url).unwrap();

    let err = client.create("", "m", Duration::from_secs(1)).unwrap_err();

    assert!(matches!(
        err,
        ApiError::UnexpectedStatus {
            expected: 201,
            actual: 400,
            ..
        }
    ));
    assert_eq!(err.to_string(), "expected response code: 201, got: 400");
    assert_eq!(err.response_body(), Some(r#"{"error":"title required"}"#));
}

#[test]
fn edit_patches_single_reminder() {
    let server = TestServer::respond(200, r#"{"id":"42"}"#);
    let client = ApiClient::new(&server.url).unwrap();

    client
        .edit("42", "new title", "new message", Duration::from_secs(90))
        .unwrap();

    let req = server.request();
    assert_eq!(req.method, "PATCH");
    assert_eq!(req.path, "/reminders/42");
    let sent: Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(sent["id"], "42");
    assert_eq!(sent["title"], "new title");
    assert_eq!(sent["message"], "new message");
    assert_eq!(sent["duration"], 90_000_000_000i64);
}

#[test]
fn fetch_joins_ids_into_one_path_segment() {
    let server = TestServer::respond(200, "[]");
    let client = ApiClient::new(&server.url).unwrap();

    let body = client.fetch(&ids(&["b", "a", "c"])).unwrap();

    assert_eq!(body, b"[]");
    let req = server.request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/reminders/b,a,c");
    assert!(req.body.is_empty());
}

#[test]
fn delete_expects_no_content() {
    let server = TestServer::respond(204, "");
    let client = ApiClient::new(&server.url).unwrap();

    client.delete(&ids(&["1", "2"])).unwrap();

    let req = server.request();
    assert_eq!(req.method, "DELETE");
    assert_eq!(req.path, "/reminders/1,2");
}

#[test]
fn delete_with_ok_instead_of_no_content_fails() {
    let server = TestServer::respond(200, "");
    let client = ApiClient::new(&server.url).unwrap();

    let err = client.delete(&ids(&["1"])).unwrap_err();

    assert_eq!(err.to_string(), "expected response code: 204, got: 200");
    assert_eq!(err.response_body(), None);
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let client = ApiClient::new(closed_url()).unwrap();

    let err = client.fetch(&ids(&["1"])).unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.to_string(), "could not make http call");
}

#[test]
fn healthy_on_200() {
    let server = TestServer::respond(200, "");
    let client = ApiClient::new("http://unused.invalid").unwrap();

    assert!(client.healthy(&server.url));
    let req = server.request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/health");
}

#[test]
fn unhealthy_on_server_error() {
    let server = TestServer::respond(500, "");
    let client = ApiClient::new(&server.url).unwrap();

    assert!(!client.healthy(&server.url));
}

#[test]
fn unhealthy_on_not_found() {
    let server = TestServer::respond(404, "");
    let client = ApiClient::new(&server.url).unwrap();

    assert!(!client.healthy(&server.url));
}

#[test]
fn unhealthy_when_nothing_listens() {
    let url = closed_url();
    let client = ApiClient::new(&url).unwrap();

    assert!(!client.healthy(&url));
}
