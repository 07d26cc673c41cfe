//! Remote REST binding of the session store contract.
//!
//! Talks JSON to a persistence collaborator:
//!
//! ```text
//! POST   /sessions                        create_session
//! PATCH  /sessions/{id}                   update_session
//! POST   /pause-logs                      create_pause_log
//! PATCH  /pause-logs/{session_id}/close   close_pause_log
//! GET    /sessions/active?userId=...      active_session (404 -> None)
//! GET    /sessions?userId=...             sessions
//! ```
//!
//! The collaborator is expected to enforce the one-open-session-per-user
//! invariant with a conditional write and answer 409 on violation, which
//! surfaces here as [`StoreError::Conflict`].

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::error::StoreError;

use super::{Session, SessionPatch, SessionQuery, SessionStore};

/// REST-backed session store.
///
/// Owns a single-threaded tokio runtime so the async `reqwest` client can
/// sit behind the synchronous store contract.
pub struct RestStore {
    base_url: Url,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl RestStore {
    /// Create a client for the collaborator at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join treats a path without a trailing slash as a file.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            runtime,
        })
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(path)?)
    }

    /// Drive a request to completion and hand back status plus body text.
    fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, String), StoreError> {
        let (status, body) = self.runtime.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })?;
        Ok((status, body))
    }

    fn expect_ok(&self, request: reqwest::RequestBuilder) -> Result<(), StoreError> {
        let (status, body) = self.send(request)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, body))
        }
    }

    fn expect_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StoreError> {
        let (status, body) = self.send(request)?;
        if !status.is_success() {
            return Err(status_error(status, body));
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Transport(e.to_string()))
    }
}

fn status_error(status: StatusCode, body: String) -> StoreError {
    if status == StatusCode::CONFLICT {
        StoreError::Conflict
    } else {
        StoreError::Http {
            status: status.as_u16(),
            message: body,
        }
    }
}

impl SessionStore for RestStore {
    fn create_session(
        &self,
        user_id: &str,
        label: &str,
        planned_duration_secs: i64,
        start_time: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let body = json!({
            "userId": user_id,
            "label": label,
            "plannedDurationSecs": planned_duration_secs,
            "startTime": start_time.to_rfc3339(),
        });
        self.expect_json(self.http.post(self.url("sessions")?).json(&body))
    }

    fn update_session(&self, id: &str, patch: SessionPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.expect_ok(
            self.http
                .patch(self.url(&format!("sessions/{id}"))?)
                .json(&patch),
        )
    }

    fn create_pause_log(
        &self,
        session_id: &str,
        pause_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let body = json!({
            "sessionId": session_id,
            "pauseTime": pause_time.to_rfc3339(),
        });
        self.expect_ok(self.http.post(self.url("pause-logs")?).json(&body))
    }

    fn close_pause_log(
        &self,
        session_id: &str,
        resume_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let body = json!({ "resumeTime": resume_time.to_rfc3339() });
        self.expect_ok(
            self.http
                .patch(self.url(&format!("pause-logs/{session_id}/close"))?)
                .json(&body),
        )
    }

    fn active_session(&self, user_id: &str) -> Result<Option<Session>, StoreError> {
        let request = self
            .http
            .get(self.url("sessions/active")?)
            .query(&[("userId", user_id)]);
        let (status, body) = self.send(request)?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, body));
        }
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| StoreError::Transport(e.to_string()))
    }

    fn sessions(&self, user_id: &str, query: &SessionQuery) -> Result<Vec<Session>, StoreError> {
        let mut request = self
            .http
            .get(self.url("sessions")?)
            .query(&[("userId", user_id)]);
        if query.completed_only {
            request = request.query(&[("completedOnly", "true")]);
        }
        if let Some(limit) = query.limit {
            request = request.query(&[("limit", limit.to_string())]);
        }
        self.expect_json(request)
    }
}
