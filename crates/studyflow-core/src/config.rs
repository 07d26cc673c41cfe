//! TOML-based application configuration.
//!
//! Stores timer durations, the store backend selection, and the local
//! user id. Configuration lives at `~/.config/studyflow/config.toml`;
//! set `STUDYFLOW_ENV=dev` to use a separate development directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::timer::ModePolicy;

/// Returns `~/.config/studyflow[-dev]/` based on STUDYFLOW_ENV.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studyflow-dev")
    } else {
        base_dir.join("studyflow")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Timer durations and cycling behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_secs")]
    pub focus_secs: i64,
    #[serde(default = "default_short_break_secs")]
    pub short_break_secs: i64,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: i64,
    #[serde(default = "default_cycles_before_long_break")]
    pub cycles_before_long_break: u32,
    #[serde(default = "default_true")]
    pub auto_advance: bool,
}

/// Which session store binding to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Rest,
}

/// Store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// Base URL of the remote collaborator; required for the rest backend.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Identity of the local user. Resolution of real identities belongs to
/// the auth collaborator; this is just the id sessions are filed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub user: UserConfig,
}

// Default functions
fn default_focus_secs() -> i64 {
    25 * 60
}
fn default_short_break_secs() -> i64 {
    5 * 60
}
fn default_long_break_secs() -> i64 {
    15 * 60
}
fn default_cycles_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}
fn default_user_id() -> String {
    "local".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_secs: default_focus_secs(),
            short_break_secs: default_short_break_secs(),
            long_break_secs: default_long_break_secs(),
            cycles_before_long_break: default_cycles_before_long_break(),
            auto_advance: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: None,
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file
    /// does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The mode policy described by the `[timer]` section.
    pub fn policy(&self) -> ModePolicy {
        ModePolicy {
            focus_secs: self.timer.focus_secs,
            short_break_secs: self.timer.short_break_secs,
            long_break_secs: self.timer.long_break_secs,
            cycles_before_long_break: self.timer.cycles_before_long_break,
        }
    }

    /// Dotted-path getter for the CLI, e.g. `timer.focus_secs`.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            "timer.focus_secs" => Ok(self.timer.focus_secs.to_string()),
            "timer.short_break_secs" => Ok(self.timer.short_break_secs.to_string()),
            "timer.long_break_secs" => Ok(self.timer.long_break_secs.to_string()),
            "timer.cycles_before_long_break" => {
                Ok(self.timer.cycles_before_long_break.to_string())
            }
            "timer.auto_advance" => Ok(self.timer.auto_advance.to_string()),
            "store.backend" => Ok(match self.store.backend {
                StoreBackend::Sqlite => "sqlite".into(),
                StoreBackend::Rest => "rest".into(),
            }),
            "store.base_url" => Ok(self.store.base_url.clone().unwrap_or_default()),
            "user.id" => Ok(self.user.id.clone()),
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }

    /// Dotted-path setter for the CLI.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };
        match key {
            "timer.focus_secs" => {
                self.timer.focus_secs = parse_secs(value).map_err(|m| invalid(&m))?
            }
            "timer.short_break_secs" => {
                self.timer.short_break_secs = parse_secs(value).map_err(|m| invalid(&m))?
            }
            "timer.long_break_secs" => {
                self.timer.long_break_secs = parse_secs(value).map_err(|m| invalid(&m))?
            }
            "timer.cycles_before_long_break" => {
                self.timer.cycles_before_long_break =
                    value.parse().map_err(|_| invalid("expected an integer"))?
            }
            "timer.auto_advance" => {
                self.timer.auto_advance =
                    value.parse().map_err(|_| invalid("expected true or false"))?
            }
            "store.backend" => {
                self.store.backend = match value {
                    "sqlite" => StoreBackend::Sqlite,
                    "rest" => StoreBackend::Rest,
                    _ => return Err(invalid("expected sqlite or rest")),
                }
            }
            "store.base_url" => {
                self.store.base_url = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "user.id" => {
                if value.is_empty() {
                    return Err(invalid("must not be empty"));
                }
                self.user.id = value.to_string();
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// All known keys with their current values, for `config list`.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        const KEYS: [&str; 8] = [
            "timer.focus_secs",
            "timer.short_break_secs",
            "timer.long_break_secs",
            "timer.cycles_before_long_break",
            "timer.auto_advance",
            "store.backend",
            "store.base_url",
            "user.id",
        ];
        KEYS.iter()
            .map(|key| (*key, self.get(key).unwrap_or_default()))
            .collect()
    }
}

fn parse_secs(value: &str) -> Result<i64, String> {
    let secs: i64 = value
        .parse()
        .map_err(|_| "expected a number of seconds".to_string())?;
    if secs <= 0 {
        return Err("duration must be positive".into());
    }
    Ok(secs)
}
