//! Activity distribution: how study time splits across categories.
//!
//! Sessions are classified by case-insensitive substring matching of
//! their label against a fixed keyword set; unmatched labels land in the
//! general bucket. The result is the top four categories by rounded
//! percentage, largest first, ties kept in first-encountered order.

use serde::{Deserialize, Serialize};

use crate::store::Session;

/// Maximum number of shares returned.
const TOP_CATEGORIES: usize = 4;

struct Category {
    name: &'static str,
    keywords: &'static [&'static str],
    color: &'static str,
}

const CATEGORIES: [Category; 7] = [
    Category {
        name: "Focus",
        keywords: &["focus"],
        color: "#3b82f6",
    },
    Category {
        name: "Pomodoro",
        keywords: &["pomodoro"],
        color: "#ef4444",
    },
    Category {
        name: "Short break",
        keywords: &["short"],
        color: "#22c55e",
    },
    Category {
        name: "Long break",
        keywords: &["long"],
        color: "#14b8a6",
    },
    Category {
        name: "Lunch",
        keywords: &["lunch"],
        color: "#f59e0b",
    },
    Category {
        name: "Tea",
        keywords: &["tea"],
        color: "#a855f7",
    },
    // Catch-all; keep last so specific categories win.
    Category {
        name: "General",
        keywords: &["work", "general"],
        color: "#64748b",
    },
];

/// One slice of the distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityShare {
    pub label: String,
    pub minutes: i64,
    /// Rounded share of total minutes, 0..=100.
    pub percentage: u32,
    /// Display color for the chart slice.
    pub color: String,
}

/// Split the sessions' minutes across activity categories.
///
/// Returns an empty list when the total is zero minutes.
pub fn activity_distribution(sessions: &[Session]) -> Vec<ActivityShare> {
    // Minutes per category, in order of first encounter.
    let mut encountered: Vec<(usize, i64)> = Vec::new();
    let mut total = 0i64;

    for session in sessions {
        let minutes = session.actual_minutes();
        if minutes <= 0 {
            continue;
        }
        total += minutes;
        let category = classify(&session.label);
        match encountered.iter_mut().find(|(idx, _)| *idx == category) {
            Some((_, sum)) => *sum += minutes,
            None => encountered.push((category, minutes)),
        }
    }

    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<ActivityShare> = encountered
        .into_iter()
        .map(|(idx, minutes)| ActivityShare {
            label: CATEGORIES[idx].name.to_string(),
            minutes,
            percentage: ((minutes as f64 / total as f64) * 100.0).round() as u32,
            color: CATEGORIES[idx].color.to_string(),
        })
        .collect();

    // Stable sort keeps first-encountered order for equal percentages.
    shares.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    shares.truncate(TOP_CATEGORIES);
    shares
}

fn classify(label: &str) -> usize {
    let label = label.to_lowercase();
    CATEGORIES
        .iter()
        .position(|c| c.keywords.iter().any(|k| label.contains(k)))
        .unwrap_or(CATEGORIES.len() - 1)
}
