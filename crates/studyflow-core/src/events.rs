use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ControllerState, Mode};

/// Every state change in the controller produces an Event.
/// The UI layer polls for snapshots and prints or renders events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: String,
        mode: Mode,
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_id: String,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: String,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the controller has already advanced to
    /// `next_mode`.
    SessionCompleted {
        session_id: String,
        mode: Mode,
        next_mode: Mode,
        at: DateTime<Utc>,
    },
    /// Open session closed without completing (reset or mode switch).
    SessionCancelled {
        session_id: String,
        mode: Mode,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: Mode,
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: ControllerState,
        mode: Mode,
        remaining_secs: i64,
        total_secs: i64,
        progress: f64,
        at: DateTime<Utc>,
    },
}
