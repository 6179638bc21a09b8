// API client module: a small blocking HTTP client that talks to the
// reminders backend. Every operation is exactly one request; nothing is
// retried and no timeout is set beyond the transport default.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures of a single backend call.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("could not marshal request body")]
    Marshal(#[source] serde_json::Error),

    #[error("could not make http call")]
    Transport(#[source] reqwest::Error),

    #[error("could not read response body")]
    ReadBody(#[source] reqwest::Error),

    #[error("expected response code: {expected}, got: {actual}")]
    UnexpectedStatus {
        expected: u16,
        actual: u16,
        body: String,
    },
}

impl ApiError {
    /// Body returned alongside an unexpected status, if the server sent one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ApiError::UnexpectedStatus { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

/// The operations the dispatcher needs from a backend. `ApiClient` is the
/// real implementation; tests drive the dispatcher with a recording fake.
pub trait ReminderBackend {
    fn create(&self, title: &str, message: &str, duration: Duration) -> Result<Vec<u8>, ApiError>;
    fn edit(
        &self,
        id: &str,
        title: &str,
        message: &str,
        duration: Duration,
    ) -> Result<Vec<u8>, ApiError>;
    fn fetch(&self, ids: &[String]) -> Result<Vec<u8>, ApiError>;
    fn delete(&self, ids: &[String]) -> Result<(), ApiError>;
    fn healthy(&self, host: &str) -> bool;
}

/// Request payload for create and edit. `id` stays empty on create since
/// the backend assigns it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReminderBody {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(serialize_with = "as_nanos")]
    pub duration: Duration,
}

// The backend reads durations as a signed nanosecond count.
fn as_nanos<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
    serializer.serialize_i64(nanos)
}

/// Blocking client bound to one backend base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url`, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Send one request and insist on `expected`. Returns the raw body.
    fn api_call<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        expected: StatusCode,
    ) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(ApiError::Marshal)?;
            req = req.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        debug!(%method, %url, "sending request");
        let res = req.send().map_err(ApiError::Transport)?;
        let status = res.status();
        let bytes = res.bytes().map_err(ApiError::ReadBody)?;
        debug!(%status, len = bytes.len(), "received response");

        if status != expected {
            warn!(expected = expected.as_u16(), actual = status.as_u16(), "unexpected status");
            return Err(ApiError::UnexpectedStatus {
                expected: expected.as_u16(),
                actual: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}

impl ReminderBackend for ApiClient {
    /// POST /reminders, expects 201.
    fn create(&self, title: &str, message: &str, duration: Duration) -> Result<Vec<u8>, ApiError> {
        let body = ReminderBody {
            id: String::new(),
            title: title.to_string(),
            message: message.to_string(),
            duration,
        };
        self.api_call(Method::POST, "/reminders", Some(&body), StatusCode::CREATED)
    }

    /// PATCH /reminders/{id}, expects 200.
    fn edit(
        &self,
        id: &str,
        title: &str,
        message: &str,
        duration: Duration,
    ) -> Result<Vec<u8>, ApiError> {
        let body = ReminderBody {
            id: id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            duration,
        };
        self.api_call(
            Method::PATCH,
            &format!("/reminders/{id}"),
            Some(&body),
            StatusCode::OK,
        )
    }

    /// GET /reminders/{a,b,c}, expects 200.
    fn fetch(&self, ids: &[String]) -> Result<Vec<u8>, ApiError> {
        self.api_call::<()>(
            Method::GET,
            &format!("/reminders/{}", ids.join(",")),
            None,
            StatusCode::OK,
        )
    }

    /// DELETE /reminders/{a,b,c}, expects 204.
    fn delete(&self, ids: &[String]) -> Result<(), ApiError> {
        self.api_call::<()>(
            Method::DELETE,
            &format!("/reminders/{}", ids.join(",")),
            None,
            StatusCode::NO_CONTENT,
        )?;
        Ok(())
    }

    /// `true` only for a 200 from `{host}/health`.
    fn healthy(&self, host: &str) -> bool {
        let url = format!("{host}/health");
        debug!(%url, "checking health");
        match self.client.get(&url).send() {
            Ok(res) => res.status() == StatusCode::OK,
            Err(err) => {
                debug!(error = %err, "health check failed");
                false
            }
        }
    }
}
