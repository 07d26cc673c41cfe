//! Session controller: the timed study/break state machine.
//!
//! The controller is wall-clock based and has no internal thread; the
//! caller invokes `tick()` periodically (once per second in the reference
//! cadence). Persistence calls on transitions are fire-and-forget with
//! respect to the countdown: a failed update is logged and the local
//! state machine proceeds. The one exception is `start()` from idle,
//! which refuses to run a countdown the store never heard about.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running -> (Paused | completion) -> Idle/Running
//! ```

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::events::Event;
use crate::store::{SessionPatch, SessionQuery, SessionStore};
use crate::timer::reconcile::{completed_focus_count_today, reconcile, Reconciliation};
use crate::timer::{Mode, ModePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    Idle,
    Running,
    Paused,
}

/// The locally tracked open session. Populated only by `start()` or
/// `resume_from_store()`, never ambient state.
#[derive(Debug, Clone)]
struct OpenSession {
    id: String,
}

/// Countdown state machine over a session store.
pub struct SessionController<S: SessionStore> {
    store: S,
    user_id: String,
    policy: ModePolicy,
    mode: Mode,
    state: ControllerState,
    /// Remaining time in milliseconds for the current interval.
    remaining_ms: u64,
    /// Timestamp (ms since epoch) of the last flush while running.
    last_tick_epoch_ms: Option<u64>,
    open: Option<OpenSession>,
    /// Focus intervals completed this run; drives long-break cadence.
    completed_focus_count: u32,
    /// Start the next countdown automatically after a completion.
    auto_advance: bool,
}

impl<S: SessionStore> SessionController<S> {
    /// Create an idle controller in focus mode at full duration.
    pub fn new(store: S, user_id: &str, policy: ModePolicy) -> Self {
        let remaining_ms = secs_to_ms(policy.duration_secs(Mode::Focus));
        Self {
            store,
            user_id: user_id.to_string(),
            policy,
            mode: Mode::Focus,
            state: ControllerState::Idle,
            remaining_ms,
            last_tick_epoch_ms: None,
            open: None,
            completed_focus_count: 0,
            auto_advance: true,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining_secs(&self) -> i64 {
        (self.remaining_ms / 1000) as i64
    }

    pub fn total_secs(&self) -> i64 {
        self.policy.duration_secs(self.mode)
    }

    pub fn open_session_id(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.id.as_str())
    }

    pub fn completed_focus_count(&self) -> u32 {
        self.completed_focus_count
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_auto_advance(&mut self, on: bool) {
        self.auto_advance = on;
    }

    /// Build a full state snapshot event for the UI layer.
    pub fn snapshot(&self) -> Event {
        let total = self.total_secs();
        let remaining = self.remaining_secs();
        let progress = if total > 0 {
            (1.0 - remaining as f64 / total as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Event::StateSnapshot {
            state: self.state,
            mode: self.mode,
            remaining_secs: remaining,
            total_secs: total,
            progress,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from idle, or resume if paused.
    ///
    /// From idle the session row is created first; if the store refuses,
    /// the controller stays idle and the error is surfaced. No silent
    /// local-only timers.
    pub fn start(&mut self) -> Result<Option<Event>, CoreError> {
        match self.state {
            ControllerState::Idle => {
                let now = Utc::now();
                let duration_secs = self.policy.duration_secs(self.mode);
                let session = self.store.create_session(
                    &self.user_id,
                    self.mode.label(),
                    duration_secs,
                    now,
                )?;
                let session_id = session.id.clone();
                self.open = Some(OpenSession { id: session.id });
                self.remaining_ms = secs_to_ms(duration_secs);
                self.state = ControllerState::Running;
                self.last_tick_epoch_ms = Some(now_ms());
                Ok(Some(Event::SessionStarted {
                    session_id,
                    mode: self.mode,
                    duration_secs,
                    at: now,
                }))
            }
            ControllerState::Paused => Ok(self.resume()),
            ControllerState::Running => Ok(None), // Already running.
        }
    }

    /// Pause the running countdown and log the pause event.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != ControllerState::Running {
            return None;
        }
        self.flush_elapsed();
        let now = Utc::now();
        let session_id = match self.open {
            Some(ref open) => open.id.clone(),
            None => return None,
        };
        if let Err(e) = self.store.create_pause_log(&session_id, now) {
            warn!("could not record pause for session {session_id}: {e}");
        }
        if let Err(e) = self.store.update_session(&session_id, SessionPatch::paused(true)) {
            warn!("could not mark session {session_id} paused: {e}");
        }
        self.state = ControllerState::Paused;
        self.last_tick_epoch_ms = None;
        Some(Event::SessionPaused {
            session_id,
            remaining_secs: self.remaining_secs(),
            at: now,
        })
    }

    /// Resume a paused countdown. The open session is reused; no new row
    /// is created.
    pub fn resume(&mut self) -> Option<Event> {
        if self.state != ControllerState::Paused {
            return None;
        }
        let now = Utc::now();
        let session_id = match self.open {
            Some(ref open) => open.id.clone(),
            None => return None,
        };
        if let Err(e) = self.store.close_pause_log(&session_id, now) {
            warn!("could not close pause log for session {session_id}: {e}");
        }
        if let Err(e) = self.store.update_session(&session_id, SessionPatch::paused(false)) {
            warn!("could not mark session {session_id} resumed: {e}");
        }
        self.state = ControllerState::Running;
        self.last_tick_epoch_ms = Some(now_ms());
        Some(Event::SessionResumed {
            session_id,
            remaining_secs: self.remaining_secs(),
            at: now,
        })
    }

    /// Call periodically while running. Returns the completion event when
    /// the countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != ControllerState::Running {
            return None;
        }
        self.flush_elapsed();
        if self.remaining_ms == 0 {
            return Some(self.complete());
        }
        None
    }

    /// Close out the current interval as completed and advance the mode.
    ///
    /// Normally invoked by `tick()` when the countdown hits zero, and by
    /// reconciliation for intervals that elapsed while inactive.
    pub fn complete(&mut self) -> Event {
        let now = Utc::now();
        let finished_mode = self.mode;
        let session_id = self.open.take().map(|o| o.id).unwrap_or_default();
        if !session_id.is_empty() {
            if let Err(e) = self
                .store
                .update_session(&session_id, SessionPatch::completed(now))
            {
                warn!("could not persist completion of session {session_id}: {e}");
            }
        }

        let next_mode = if finished_mode == Mode::Focus {
            self.completed_focus_count += 1;
            self.policy.next_mode(self.completed_focus_count)
        } else {
            Mode::Focus
        };
        self.mode = next_mode;
        let duration_secs = self.policy.duration_secs(next_mode);
        self.remaining_ms = secs_to_ms(duration_secs);

        if self.auto_advance {
            // The next interval gets its own session row; without one we
            // fall back to idle rather than run untracked.
            match self
                .store
                .create_session(&self.user_id, next_mode.label(), duration_secs, now)
            {
                Ok(session) => {
                    self.open = Some(OpenSession { id: session.id });
                    self.state = ControllerState::Running;
                    self.last_tick_epoch_ms = Some(now_ms());
                }
                Err(e) => {
                    warn!("auto-advance could not open the next session: {e}");
                    self.state = ControllerState::Idle;
                    self.last_tick_epoch_ms = None;
                }
            }
        } else {
            self.state = ControllerState::Idle;
            self.last_tick_epoch_ms = None;
        }

        Event::SessionCompleted {
            session_id,
            mode: finished_mode,
            next_mode,
            at: now,
        }
    }

    /// Cancel the open interval (if any) and return to idle at the
    /// current mode's full duration.
    pub fn reset(&mut self) -> Option<Event> {
        if self.state == ControllerState::Idle {
            return None;
        }
        let now = Utc::now();
        let session_id = self.cancel_open(now)?;
        self.remaining_ms = secs_to_ms(self.policy.duration_secs(self.mode));
        self.state = ControllerState::Idle;
        self.last_tick_epoch_ms = None;
        Some(Event::SessionCancelled {
            session_id,
            mode: self.mode,
            at: now,
        })
    }

    /// User-initiated mode override. Cancels any open interval and
    /// returns to idle at the new mode's full duration.
    pub fn switch_mode(&mut self, mode: Mode) -> Event {
        let now = Utc::now();
        self.cancel_open(now);
        self.mode = mode;
        let duration_secs = self.policy.duration_secs(mode);
        self.remaining_ms = secs_to_ms(duration_secs);
        self.state = ControllerState::Idle;
        self.last_tick_epoch_ms = None;
        Event::ModeSwitched {
            mode,
            duration_secs,
            at: now,
        }
    }

    /// Restore controller state from the store on activation.
    ///
    /// Returns the snapshot of the restored state, the completion event
    /// if the open interval elapsed while inactive, or `None` when there
    /// was nothing to restore. A failed query is treated as "no open
    /// session": startup never blocks on the collaborator.
    pub fn resume_from_store(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let open = match self.store.active_session(&self.user_id) {
            Ok(open) => open,
            Err(e) => {
                warn!("could not query the open session, starting fresh: {e}");
                None
            }
        };
        match reconcile(open, now) {
            Reconciliation::Fresh => None,
            Reconciliation::Restored {
                session,
                remaining_secs,
            } => {
                self.mode = Mode::from_label(&session.label).unwrap_or(Mode::Focus);
                self.remaining_ms = secs_to_ms(remaining_secs);
                self.open = Some(OpenSession {
                    id: session.id.clone(),
                });
                if session.is_paused {
                    self.state = ControllerState::Paused;
                    self.last_tick_epoch_ms = None;
                } else {
                    self.state = ControllerState::Running;
                    self.last_tick_epoch_ms = Some(now_ms());
                }
                Some(self.snapshot())
            }
            Reconciliation::Elapsed { session } => {
                // The cycle counter did not survive the restart; rebuild
                // long-break eligibility from persisted history.
                let history = self
                    .store
                    .sessions(&self.user_id, &SessionQuery::completed())
                    .unwrap_or_else(|e| {
                        warn!("could not load session history: {e}");
                        Vec::new()
                    });
                self.completed_focus_count =
                    completed_focus_count_today(&history, self.policy.focus_secs, now);
                self.mode = Mode::from_label(&session.label).unwrap_or(Mode::Focus);
                self.open = Some(OpenSession { id: session.id });
                Some(self.complete())
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self) {
        if let Some(last) = self.last_tick_epoch_ms {
            let now = now_ms();
            let elapsed = now.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now);
        }
    }

    fn cancel_open(&mut self, now: DateTime<Utc>) -> Option<String> {
        let session_id = self.open.take()?.id;
        if let Err(e) = self
            .store
            .update_session(&session_id, SessionPatch::cancelled(now))
        {
            warn!("could not persist cancellation of session {session_id}: {e}");
        }
        Some(session_id)
    }
}

fn secs_to_ms(secs: i64) -> u64 {
    (secs.max(0) as u64).saturating_mul(1000)
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
