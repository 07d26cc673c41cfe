use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Timer mode. Each mode has a fixed planned duration from [`ModePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "focus")]
    Focus,
    #[serde(rename = "break-short")]
    ShortBreak,
    #[serde(rename = "break-long")]
    LongBreak,
}

impl Mode {
    /// Stable string form, also used as the session label.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::ShortBreak => "break-short",
            Mode::LongBreak => "break-long",
        }
    }

    pub fn from_label(label: &str) -> Option<Mode> {
        match label {
            "focus" => Some(Mode::Focus),
            "break-short" => Some(Mode::ShortBreak),
            "break-long" => Some(Mode::LongBreak),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Result<Mode, ValidationError> {
        Mode::from_label(value).ok_or_else(|| ValidationError::InvalidValue {
            field: "mode".into(),
            message: format!("expected focus, break-short or break-long, got '{value}'"),
        })
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Mode::Focus)
    }
}

/// Mode durations and the long-break cadence.
///
/// The durations are configuration; the default cadence (a long break
/// after every fourth completed focus interval) is preserved unless
/// overridden.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModePolicy {
    pub focus_secs: i64,
    pub short_break_secs: i64,
    pub long_break_secs: i64,
    pub cycles_before_long_break: u32,
}

impl Default for ModePolicy {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            cycles_before_long_break: 4,
        }
    }
}

impl ModePolicy {
    pub fn duration_secs(&self, mode: Mode) -> i64 {
        match mode {
            Mode::Focus => self.focus_secs,
            Mode::ShortBreak => self.short_break_secs,
            Mode::LongBreak => self.long_break_secs,
        }
    }

    /// Break mode after a completed focus interval.
    ///
    /// `completed_focus_count` counts focus intervals completed so far,
    /// including the one that just finished. Completing a break always
    /// returns to focus; that is the controller's job, not this one's.
    pub fn next_mode(&self, completed_focus_count: u32) -> Mode {
        if self.cycles_before_long_break > 0
            && completed_focus_count > 0
            && completed_focus_count % self.cycles_before_long_break == 0
        {
            Mode::LongBreak
        } else {
            Mode::ShortBreak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations() {
        let policy = ModePolicy::default();
        assert_eq!(policy.duration_secs(Mode::Focus), 1500);
        assert_eq!(policy.duration_secs(Mode::ShortBreak), 300);
        assert_eq!(policy.duration_secs(Mode::LongBreak), 900);
    }

    #[test]
    fn every_fourth_focus_earns_a_long_break() {
        let policy = ModePolicy::default();
        assert_eq!(policy.next_mode(1), Mode::ShortBreak);
        assert_eq!(policy.next_mode(2), Mode::ShortBreak);
        assert_eq!(policy.next_mode(3), Mode::ShortBreak);
        assert_eq!(policy.next_mode(4), Mode::LongBreak);
        assert_eq!(policy.next_mode(5), Mode::ShortBreak);
        assert_eq!(policy.next_mode(8), Mode::LongBreak);
    }

    #[test]
    fn zero_count_never_earns_a_long_break() {
        let policy = ModePolicy::default();
        assert_eq!(policy.next_mode(0), Mode::ShortBreak);
    }

    #[test]
    fn custom_cadence() {
        let policy = ModePolicy {
            cycles_before_long_break: 2,
            ..ModePolicy::default()
        };
        assert_eq!(policy.next_mode(1), Mode::ShortBreak);
        assert_eq!(policy.next_mode(2), Mode::LongBreak);
        assert_eq!(policy.next_mode(4), Mode::LongBreak);
    }

    #[test]
    fn labels_round_trip() {
        for mode in [Mode::Focus, Mode::ShortBreak, Mode::LongBreak] {
            assert_eq!(Mode::from_label(mode.label()), Some(mode));
        }
        assert_eq!(Mode::from_label("lunch"), None);
        assert!(Mode::parse("nope").is_err());
    }
}
