//! Local SQLite binding of the session store contract.
//!
//! Sessions and pause logs live in `~/.config/studyflow/studyflow.db`.
//! The one-open-session-per-user invariant is enforced here with a
//! partial unique index rather than by caller convention, so a second
//! `create_session` while one is open fails with [`StoreError::Conflict`].

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use crate::config::data_dir;
use crate::error::{CoreError, StoreError};

use super::{PauseLog, Session, SessionPatch, SessionQuery, SessionStore};

const SESSION_COLUMNS: &str =
    "id, user_id, label, planned_duration_secs, start_time, end_time, is_completed, is_paused";

/// SQLite-backed session store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at `~/.config/studyflow/studyflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studyflow.db");
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (tests and tooling).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id                    TEXT PRIMARY KEY,
                    user_id               TEXT NOT NULL,
                    label                 TEXT NOT NULL DEFAULT '',
                    planned_duration_secs INTEGER NOT NULL,
                    start_time            TEXT NOT NULL,
                    end_time              TEXT,
                    is_completed          INTEGER NOT NULL DEFAULT 0,
                    is_paused             INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS pause_logs (
                    session_id  TEXT NOT NULL,
                    pause_time  TEXT NOT NULL,
                    resume_time TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user_start
                    ON sessions(user_id, start_time);
                CREATE INDEX IF NOT EXISTS idx_pause_logs_session
                    ON pause_logs(session_id);
                -- At most one open session per user.
                CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_open
                    ON sessions(user_id) WHERE end_time IS NULL;",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    /// Pause history for a session, oldest first. Not part of the store
    /// contract; used for auditing and tests.
    pub fn pause_logs(&self, session_id: &str) -> Result<Vec<PauseLog>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, pause_time, resume_time
             FROM pause_logs WHERE session_id = ?1 ORDER BY pause_time ASC",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok(PauseLog {
                session_id: row.get(0)?,
                pause_time: parse_ts(row, 1)?,
                resume_time: parse_opt_ts(row, 2)?,
            })
        })?;
        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }
}

impl SessionStore for SqliteStore {
    fn create_session(
        &self,
        user_id: &str,
        label: &str,
        planned_duration_secs: i64,
        start_time: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO sessions (id, user_id, label, planned_duration_secs, start_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                user_id,
                label,
                planned_duration_secs,
                start_time.to_rfc3339(),
            ],
        )?;
        Ok(Session {
            id,
            user_id: user_id.to_string(),
            label: label.to_string(),
            planned_duration_secs,
            start_time,
            end_time: None,
            is_completed: false,
            is_paused: false,
        })
    }

    fn update_session(&self, id: &str, patch: SessionPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(end) = patch.end_time {
            sets.push("end_time = ?");
            values.push(Value::Text(end.to_rfc3339()));
        }
        if let Some(done) = patch.is_completed {
            sets.push("is_completed = ?");
            values.push(Value::Integer(done as i64));
        }
        if let Some(paused) = patch.is_paused {
            sets.push("is_paused = ?");
            values.push(Value::Integer(paused as i64));
        }
        values.push(Value::Text(id.to_string()));
        let sql = format!("UPDATE sessions SET {} WHERE id = ?", sets.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn create_pause_log(
        &self,
        session_id: &str,
        pause_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO pause_logs (session_id, pause_time) VALUES (?1, ?2)",
            params![session_id, pause_time.to_rfc3339()],
        )?;
        Ok(())
    }

    fn close_pause_log(
        &self,
        session_id: &str,
        resume_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // Only the latest open entry gets the resume stamp.
        self.conn.execute(
            "UPDATE pause_logs SET resume_time = ?1
             WHERE rowid = (
                 SELECT rowid FROM pause_logs
                 WHERE session_id = ?2 AND resume_time IS NULL
                 ORDER BY pause_time DESC LIMIT 1
             )",
            params![resume_time.to_rfc3339(), session_id],
        )?;
        Ok(())
    }

    fn active_session(&self, user_id: &str) -> Result<Option<Session>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE user_id = ?1 AND end_time IS NULL LIMIT 1"
        ))?;
        let result = stmt.query_row(params![user_id], row_to_session);
        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn sessions(&self, user_id: &str, query: &SessionQuery) -> Result<Vec<Session>, StoreError> {
        let mut sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = ?");
        let mut values: Vec<Value> = vec![Value::Text(user_id.to_string())];
        if query.completed_only {
            sql.push_str(" AND is_completed = 1");
        }
        sql.push_str(" ORDER BY start_time DESC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), row_to_session)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        label: row.get(2)?,
        planned_duration_secs: row.get(3)?,
        start_time: parse_ts(row, 4)?,
        end_time: parse_opt_ts(row, 5)?,
        is_completed: row.get::<_, i64>(6)? != 0,
        is_paused: row.get::<_, i64>(7)? != 0,
    })
}

fn parse_ts(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_opt_ts(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        None => Ok(None),
        Some(text) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_fetch_active() {
        let store = SqliteStore::open_memory().unwrap();
        let now = Utc::now();
        let created = store.create_session("alice", "focus", 1500, now).unwrap();

        let active = store.active_session("alice").unwrap().unwrap();
        assert_eq!(active.id, created.id);
        assert_eq!(active.planned_duration_secs, 1500);
        assert!(active.is_open());
        assert!(!active.is_completed);

        assert!(store.active_session("bob").unwrap().is_none());
    }

    #[test]
    fn second_open_session_conflicts() {
        let store = SqliteStore::open_memory().unwrap();
        let now = Utc::now();
        store.create_session("alice", "focus", 1500, now).unwrap();

        let err = store
            .create_session("alice", "break-short", 300, now)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        // A different user is unaffected.
        store.create_session("bob", "focus", 1500, now).unwrap();
    }

    #[test]
    fn complete_then_reopen() {
        let store = SqliteStore::open_memory().unwrap();
        let now = Utc::now();
        let first = store.create_session("alice", "focus", 1500, now).unwrap();
        store
            .update_session(&first.id, SessionPatch::completed(now))
            .unwrap();
        assert!(store.active_session("alice").unwrap().is_none());

        // Closing the first session frees the slot.
        store.create_session("alice", "break-short", 300, now).unwrap();
    }

    #[test]
    fn update_unknown_session_is_not_found() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .update_session("nope", SessionPatch::paused(true))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn pause_log_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let now = Utc::now();
        let session = store.create_session("alice", "focus", 1500, now).unwrap();

        store.create_pause_log(&session.id, now).unwrap();
        let later = now + chrono::Duration::seconds(90);
        store.close_pause_log(&session.id, later).unwrap();

        let logs = store.pause_logs(&session.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].pause_time, now);
        assert_eq!(logs[0].resume_time, Some(later));
    }

    #[test]
    fn close_pause_log_targets_latest_open_entry() {
        let store = SqliteStore::open_memory().unwrap();
        let now = Utc::now();
        let session = store.create_session("alice", "focus", 1500, now).unwrap();

        store.create_pause_log(&session.id, now).unwrap();
        store
            .close_pause_log(&session.id, now + chrono::Duration::seconds(10))
            .unwrap();
        store
            .create_pause_log(&session.id, now + chrono::Duration::seconds(60))
            .unwrap();
        store
            .close_pause_log(&session.id, now + chrono::Duration::seconds(70))
            .unwrap();

        let logs = store.pause_logs(&session.id).unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.resume_time.is_some()));
    }

    #[test]
    fn sessions_query_ordering_and_filters() {
        let store = SqliteStore::open_memory().unwrap();
        let now = Utc::now();
        for offset_min in [30, 20, 10] {
            let start = now - chrono::Duration::minutes(offset_min);
            let s = store.create_session("alice", "focus", 1500, start).unwrap();
            store
                .update_session(
                    &s.id,
                    SessionPatch::completed(start + chrono::Duration::minutes(5)),
                )
                .unwrap();
        }
        // One cancelled session, excluded when completed_only is set.
        let cancelled = store.create_session("alice", "focus", 1500, now).unwrap();
        store
            .update_session(&cancelled.id, SessionPatch::cancelled(now))
            .unwrap();

        let all = store
            .sessions("alice", &SessionQuery::default())
            .unwrap();
        assert_eq!(all.len(), 4);
        // Most-recent-first.
        assert!(all.windows(2).all(|w| w[0].start_time >= w[1].start_time));

        let completed = store
            .sessions("alice", &SessionQuery::completed())
            .unwrap();
        assert_eq!(completed.len(), 3);

        let limited = store
            .sessions("alice", &SessionQuery::recent(2))
            .unwrap();
        assert_eq!(limited.len(), 2);
    }
}
