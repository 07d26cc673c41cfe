use chrono::Utc;
use clap::Subcommand;
use studyflow_core::{Config, Event, Mode, SessionController};

use crate::common::{open_store, print_json};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown, or resume if paused
    Start,
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Cancel the open session and return to idle
    Reset,
    /// Cancel any open session and switch mode
    Switch {
        /// focus, break-short or break-long
        mode: String,
    },
    /// Print current timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let mut controller = SessionController::new(store, &config.user.id, config.policy());
    controller.set_auto_advance(config.timer.auto_advance);

    // Each invocation restores state from the store; the open interval
    // may have elapsed in the meantime and completed implicitly.
    if let Some(event @ Event::SessionCompleted { .. }) = controller.resume_from_store(Utc::now())
    {
        print_json(&event)?;
    }

    match action {
        TimerAction::Start => match controller.start()? {
            Some(event) => print_json(&event)?,
            None => print_json(&controller.snapshot())?,
        },
        TimerAction::Pause => match controller.pause() {
            Some(event) => print_json(&event)?,
            None => print_json(&controller.snapshot())?,
        },
        TimerAction::Resume => match controller.resume() {
            Some(event) => print_json(&event)?,
            None => print_json(&controller.snapshot())?,
        },
        TimerAction::Reset => match controller.reset() {
            Some(event) => print_json(&event)?,
            None => print_json(&controller.snapshot())?,
        },
        TimerAction::Switch { mode } => {
            let mode = Mode::parse(&mode)?;
            let event = controller.switch_mode(mode);
            print_json(&event)?;
        }
        TimerAction::Status => {
            if let Some(event) = controller.tick() {
                print_json(&event)?;
            }
            print_json(&controller.snapshot())?;
        }
    }
    Ok(())
}
