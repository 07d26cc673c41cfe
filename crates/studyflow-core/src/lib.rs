//! # StudyFlow Core Library
//!
//! This library provides the core business logic for StudyFlow's timed
//! study/break sessions. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Session Controller**: A wall-clock-based state machine that
//!   requires the caller to periodically invoke `tick()` for progress
//! - **Reconciliation**: Restores the open session after a restart by
//!   recomputing remaining time from wall-clock deltas
//! - **Store**: One contract, two bindings -- local SQLite and a remote
//!   REST collaborator
//! - **Statistics**: Pure folds over session history (totals, streak,
//!   weekday chart, activity distribution)
//!
//! ## Key Components
//!
//! - [`SessionController`]: Core timer state machine
//! - [`SessionStore`]: Persistence collaborator contract
//! - [`Config`]: Application configuration management

pub mod config;
pub mod error;
pub mod events;
pub mod stats;
pub mod store;
pub mod timer;

pub use config::{Config, StoreBackend};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use stats::{
    activity_distribution, summarize, weekday_totals, ActivityShare, StudySummary, WeekdayChart,
};
pub use store::{
    PauseLog, RestStore, Session, SessionPatch, SessionQuery, SessionStore, SqliteStore,
};
pub use timer::{ControllerState, Mode, ModePolicy, SessionController};
