use chrono::Local;
use clap::Subcommand;
use serde_json::json;
use studyflow_core::{
    activity_distribution, stats::WEEKDAY_LABELS, summarize, weekday_totals, Config, SessionQuery,
    SessionStore,
};

use crate::common::{open_store, print_json};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today/week totals and the day streak
    Summary,
    /// Minutes per weekday for the current week
    Weekday,
    /// Activity distribution across categories
    Activity,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let history = store.sessions(&config.user.id, &SessionQuery::completed())?;
    let now = Local::now();

    match action {
        StatsAction::Summary => {
            print_json(&summarize(&history, now))?;
        }
        StatsAction::Weekday => {
            let chart = weekday_totals(&history, now);
            print_json(&json!({
                "labels": WEEKDAY_LABELS,
                "minutes": chart.minutes,
            }))?;
        }
        StatsAction::Activity => {
            print_json(&activity_distribution(&history))?;
        }
    }
    Ok(())
}
