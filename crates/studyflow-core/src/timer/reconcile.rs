//! Wall-clock reconciliation of an open session after an interruption.
//!
//! The countdown lives in memory, so a restart loses it. What survives is
//! the persisted session row: remaining time is recomputed from the
//! wall-clock delta, and a session whose planned interval fully elapsed
//! while the process was away is completed implicitly.

use chrono::{DateTime, Utc};

use crate::store::Session;
use crate::timer::Mode;

/// Outcome of inspecting the user's open session on activation.
#[derive(Debug, Clone)]
pub enum Reconciliation {
    /// No open session; start idle in focus mode at full duration.
    Fresh,
    /// The open session still has time on the clock.
    Restored {
        session: Session,
        remaining_secs: i64,
    },
    /// The planned interval elapsed while inactive; complete it through
    /// the normal completion path.
    Elapsed { session: Session },
}

/// Classify the open session (if any) against the current wall clock.
///
/// Remaining time is exact integer seconds: `planned - floor(now - start)`.
pub fn reconcile(open: Option<Session>, now: DateTime<Utc>) -> Reconciliation {
    let session = match open {
        Some(s) if !s.is_completed => s,
        _ => return Reconciliation::Fresh,
    };
    let elapsed_secs = (now - session.start_time).num_seconds();
    let remaining_secs = session.planned_duration_secs - elapsed_secs;
    if remaining_secs > 0 {
        Reconciliation::Restored {
            session,
            remaining_secs,
        }
    } else {
        Reconciliation::Elapsed { session }
    }
}

/// Focus intervals completed today at the policy's focus duration.
///
/// The in-memory cycle counter does not survive a restart, so long-break
/// eligibility after reconciliation is rebuilt from persisted history.
pub fn completed_focus_count_today(
    sessions: &[Session],
    focus_secs: i64,
    now: DateTime<Utc>,
) -> u32 {
    let today = now.date_naive();
    sessions
        .iter()
        .filter(|s| {
            s.is_completed
                && s.label == Mode::Focus.label()
                && s.planned_duration_secs == focus_secs
                && s.start_time.date_naive() == today
        })
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn open_session(planned: i64, started_secs_ago: i64, now: DateTime<Utc>) -> Session {
        Session {
            id: "s-1".into(),
            user_id: "u-1".into(),
            label: "focus".into(),
            planned_duration_secs: planned,
            start_time: now - Duration::seconds(started_secs_ago),
            end_time: None,
            is_completed: false,
            is_paused: false,
        }
    }

    #[test]
    fn no_open_session_is_fresh() {
        assert!(matches!(reconcile(None, Utc::now()), Reconciliation::Fresh));
    }

    #[test]
    fn completed_session_is_fresh() {
        let now = Utc::now();
        let mut session = open_session(1500, 10, now);
        session.is_completed = true;
        assert!(matches!(
            reconcile(Some(session), now),
            Reconciliation::Fresh
        ));
    }

    #[test]
    fn partial_elapse_restores_exact_remaining() {
        let now = Utc::now();
        let session = open_session(1500, 600, now);
        match reconcile(Some(session), now) {
            Reconciliation::Restored { remaining_secs, .. } => {
                assert_eq!(remaining_secs, 900)
            }
            other => panic!("expected Restored, got {other:?}"),
        }
    }

    #[test]
    fn full_elapse_is_elapsed() {
        let now = Utc::now();
        for ago in [1500, 1501, 90_000] {
            let session = open_session(1500, ago, now);
            assert!(matches!(
                reconcile(Some(session), now),
                Reconciliation::Elapsed { .. }
            ));
        }
    }

    proptest! {
        #[test]
        fn remaining_is_planned_minus_elapsed(
            planned in 1i64..86_400,
            elapsed in 0i64..86_400,
        ) {
            let now = Utc::now();
            let session = open_session(planned, elapsed, now);
            match reconcile(Some(session), now) {
                Reconciliation::Restored { remaining_secs, .. } => {
                    prop_assert!(elapsed < planned);
                    prop_assert_eq!(remaining_secs, planned - elapsed);
                }
                Reconciliation::Elapsed { .. } => prop_assert!(elapsed >= planned),
                Reconciliation::Fresh => prop_assert!(false, "open session cannot be Fresh"),
            }
        }
    }

    #[test]
    fn focus_count_ignores_other_days_labels_and_durations() {
        let now = Utc::now();
        let mk = |label: &str, planned: i64, days_ago: i64, completed: bool| Session {
            id: label.to_string(),
            user_id: "u-1".into(),
            label: label.to_string(),
            planned_duration_secs: planned,
            start_time: now - Duration::days(days_ago),
            end_time: Some(now - Duration::days(days_ago) + Duration::seconds(planned)),
            is_completed: completed,
            is_paused: false,
        };
        let sessions = vec![
            mk("focus", 1500, 0, true),
            mk("focus", 1500, 0, true),
            mk("focus", 1500, 1, true),   // yesterday
            mk("focus", 3000, 0, true),   // different planned duration
            mk("break-short", 300, 0, true),
            mk("focus", 1500, 0, false),  // cancelled
        ];
        assert_eq!(completed_focus_count_today(&sessions, 1500, now), 2);
    }
}
