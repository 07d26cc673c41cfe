//! Minutes per weekday for the current week's chart.

use chrono::{DateTime, Datelike, Days, TimeZone};
use serde::{Deserialize, Serialize};

use crate::store::Session;

use super::summary::{local_date, start_of_week};

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Chart data: one minute bucket per day of the current week, Sun..Sat.
/// Days without sessions stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayChart {
    pub minutes: [i64; 7],
}

impl WeekdayChart {
    pub fn total(&self) -> i64 {
        self.minutes.iter().sum()
    }
}

/// Bucket this week's sessions by weekday.
pub fn weekday_totals<Tz: TimeZone>(sessions: &[Session], now: DateTime<Tz>) -> WeekdayChart {
    let week_start = start_of_week(&now);
    let week_end = week_start + Days::new(7);

    let mut chart = WeekdayChart::default();
    for session in sessions {
        let date = local_date(session, &now);
        if date < week_start || date >= week_end {
            continue;
        }
        let bucket = date.weekday().num_days_from_sunday() as usize;
        chart.minutes[bucket] += session.actual_minutes();
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn utc_datetime(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn session(start: DateTime<Utc>, minutes: i64) -> Session {
        Session {
            id: format!("s-{start}"),
            user_id: "u-1".into(),
            label: "focus".into(),
            planned_duration_secs: minutes * 60,
            start_time: start,
            end_time: Some(start + Duration::minutes(minutes)),
            is_completed: true,
            is_paused: false,
        }
    }

    #[test]
    fn buckets_fall_on_their_weekday() {
        // Week of Sun 2024-01-14 .. Sat 2024-01-20; "now" is Wednesday.
        let now = utc_datetime(2024, 1, 17, 20);
        let sessions = vec![
            session(utc_datetime(2024, 1, 14, 10), 30), // Sunday
            session(utc_datetime(2024, 1, 16, 10), 45), // Tuesday
            session(utc_datetime(2024, 1, 16, 15), 15), // Tuesday again
            session(utc_datetime(2024, 1, 17, 10), 25), // Wednesday
        ];
        let chart = weekday_totals(&sessions, now);
        assert_eq!(chart.minutes, [30, 0, 60, 25, 0, 0, 0]);
        assert_eq!(chart.total(), 115);
    }

    #[test]
    fn sessions_outside_the_week_are_ignored() {
        let now = utc_datetime(2024, 1, 17, 20);
        let sessions = vec![
            session(utc_datetime(2024, 1, 13, 10), 30), // previous Saturday
            session(utc_datetime(2024, 1, 21, 10), 30), // next Sunday
        ];
        let chart = weekday_totals(&sessions, now);
        assert_eq!(chart, WeekdayChart::default());
    }

    #[test]
    fn empty_history_is_all_zeroes() {
        let now = utc_datetime(2024, 1, 17, 20);
        assert_eq!(weekday_totals(&[], now).minutes, [0; 7]);
    }
}
