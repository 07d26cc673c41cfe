//! Session persistence: record types and the store contract.
//!
//! The store keeps one row per timed interval (focus or break) plus an
//! append-only pause log. Two bindings implement the same contract:
//! [`SqliteStore`] over a local database and [`RestStore`] over a remote
//! JSON collaborator.

pub mod rest;
pub mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One timed interval, from start to completion or cancellation.
///
/// At most one session per user is "open" (`end_time == None`) at any
/// time; the stores enforce this on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque identifier assigned by the store on creation.
    pub id: String,
    pub user_id: String,
    /// Free-text activity category, e.g. "focus" or "break-short".
    pub label: String,
    pub planned_duration_secs: i64,
    pub start_time: DateTime<Utc>,
    /// Set only on completion or cancellation.
    pub end_time: Option<DateTime<Utc>>,
    /// True only if the countdown reached zero naturally.
    pub is_completed: bool,
    /// Toggled by pause/resume; does not stop wall-clock accrual.
    pub is_paused: bool,
}

impl Session {
    /// Actual duration in seconds (`end - start`), falling back to the
    /// planned duration while the session is still open.
    pub fn actual_duration_secs(&self) -> i64 {
        match self.end_time {
            Some(end) => (end - self.start_time).num_seconds(),
            None => self.planned_duration_secs,
        }
    }

    /// Actual duration in whole minutes, floored.
    pub fn actual_minutes(&self) -> i64 {
        self.actual_duration_secs() / 60
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Pause event. Resume stamps `resume_time` on the latest open entry so
/// active time stays reconstructible from the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseLog {
    pub session_id: String,
    pub pause_time: DateTime<Utc>,
    pub resume_time: Option<DateTime<Utc>>,
}

/// Partial update applied to a session row. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
}

impl SessionPatch {
    /// Countdown reached zero naturally.
    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            end_time: Some(at),
            is_completed: Some(true),
            is_paused: None,
        }
    }

    /// User abandoned the interval (reset or mode switch).
    pub fn cancelled(at: DateTime<Utc>) -> Self {
        Self {
            end_time: Some(at),
            is_completed: Some(false),
            is_paused: None,
        }
    }

    pub fn paused(paused: bool) -> Self {
        Self {
            end_time: None,
            is_completed: None,
            is_paused: Some(paused),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end_time.is_none() && self.is_completed.is_none() && self.is_paused.is_none()
    }
}

/// Filter for [`SessionStore::sessions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionQuery {
    pub limit: Option<usize>,
    pub completed_only: bool,
}

impl SessionQuery {
    pub fn completed() -> Self {
        Self {
            limit: None,
            completed_only: true,
        }
    }

    pub fn recent(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            completed_only: false,
        }
    }
}

/// The persistence collaborator contract consumed by the timer core.
///
/// Read operations are idempotent and may be retried freely by callers;
/// writes are issued once per transition and never retried here. The
/// execution model is single-threaded and cooperative, so the contract
/// demands no thread-safety of its bindings.
pub trait SessionStore {
    /// Create an open session and return it with its store-assigned id.
    fn create_session(
        &self,
        user_id: &str,
        label: &str,
        planned_duration_secs: i64,
        start_time: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    /// Apply a partial update to an existing session.
    fn update_session(&self, id: &str, patch: SessionPatch) -> Result<(), StoreError>;

    /// Append a pause event for the session.
    fn create_pause_log(&self, session_id: &str, pause_time: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// Stamp the resume time on the session's latest open pause entry.
    fn close_pause_log(&self, session_id: &str, resume_time: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// The user's open session, if any.
    fn active_session(&self, user_id: &str) -> Result<Option<Session>, StoreError>;

    /// Session history, most-recent-first.
    fn sessions(&self, user_id: &str, query: &SessionQuery) -> Result<Vec<Session>, StoreError>;
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn create_session(
        &self,
        user_id: &str,
        label: &str,
        planned_duration_secs: i64,
        start_time: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        (**self).create_session(user_id, label, planned_duration_secs, start_time)
    }

    fn update_session(&self, id: &str, patch: SessionPatch) -> Result<(), StoreError> {
        (**self).update_session(id, patch)
    }

    fn create_pause_log(
        &self,
        session_id: &str,
        pause_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        (**self).create_pause_log(session_id, pause_time)
    }

    fn close_pause_log(
        &self,
        session_id: &str,
        resume_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        (**self).close_pause_log(session_id, resume_time)
    }

    fn active_session(&self, user_id: &str) -> Result<Option<Session>, StoreError> {
        (**self).active_session(user_id)
    }

    fn sessions(&self, user_id: &str, query: &SessionQuery) -> Result<Vec<Session>, StoreError> {
        (**self).sessions(user_id, query)
    }
}
