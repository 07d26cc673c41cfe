//! Daily/weekly totals and the day streak.
//!
//! All functions are pure folds over a session list. Calendar boundaries
//! (midnight, start of week, streak days) are evaluated in the timezone
//! of the caller-supplied `now`, so "today" means the user's today.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::store::Session;

/// Headline numbers for the stats screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySummary {
    /// Minutes accumulated since local midnight.
    pub today_minutes: i64,
    /// Minutes accumulated since the start of the week (Sunday, local).
    pub week_minutes: i64,
    /// Consecutive days, ending today, with at least one session.
    pub day_streak: u32,
}

/// Fold the session history into a [`StudySummary`].
pub fn summarize<Tz: TimeZone>(sessions: &[Session], now: DateTime<Tz>) -> StudySummary {
    StudySummary {
        today_minutes: today_minutes(sessions, now.clone()),
        week_minutes: week_minutes(sessions, now.clone()),
        day_streak: day_streak(sessions, now),
    }
}

/// Minutes for sessions starting within `[local midnight, midnight + 24h)`.
pub fn today_minutes<Tz: TimeZone>(sessions: &[Session], now: DateTime<Tz>) -> i64 {
    let today = now.date_naive();
    sessions
        .iter()
        .filter(|s| local_date(s, &now) == today)
        .map(Session::actual_minutes)
        .sum()
}

/// Minutes for sessions starting on or after the start of the week.
pub fn week_minutes<Tz: TimeZone>(sessions: &[Session], now: DateTime<Tz>) -> i64 {
    let week_start = start_of_week(&now);
    sessions
        .iter()
        .filter(|s| local_date(s, &now) >= week_start)
        .map(Session::actual_minutes)
        .sum()
}

/// Walk backward from today, counting days with at least one session.
/// The first gap halts the count; a day with no session today yields 0.
pub fn day_streak<Tz: TimeZone>(sessions: &[Session], now: DateTime<Tz>) -> u32 {
    let active_days: HashSet<NaiveDate> =
        sessions.iter().map(|s| local_date(s, &now)).collect();

    let mut streak = 0;
    let mut day = now.date_naive();
    while active_days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// The week starts on Sunday, local time.
pub(crate) fn start_of_week<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    let today = now.date_naive();
    today - Days::new(u64::from(today.weekday().num_days_from_sunday()))
}

pub(crate) fn local_date<Tz: TimeZone>(session: &Session, now: &DateTime<Tz>) -> NaiveDate {
    session
        .start_time
        .with_timezone(&now.timezone())
        .date_naive()
}
