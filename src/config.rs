//! User configuration loaded from a TOML file.
//!
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```toml
//! [reminders]
//! due_soon_hours = 2
//! show_on_startup = true
//!
//! [display]
//! color = true
//! ```

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TaskError};
use crate::reminders::{ReminderPolicy, DEFAULT_DUE_SOON_HOURS};

/// Largest accepted `reminders.due_soon_hours`: one year.
pub const MAX_DUE_SOON_HOURS: i64 = 24 * 365;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reminders: ReminderSettings,
    pub display: DisplaySettings,
}

/// Reminder behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Look-ahead window for "due soon", in hours. Between 1 and
    /// [`MAX_DUE_SOON_HOURS`].
    pub due_soon_hours: i64,
    /// Print the reminder banner when a session starts.
    pub show_on_startup: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            due_soon_hours: DEFAULT_DUE_SOON_HOURS,
            show_on_startup: true,
        }
    }
}

impl ReminderSettings {
    /// Policy for building a reminder report at `reference`.
    ///
    /// Fails with [`TaskError::Config`] when the window does not fit a
    /// [`Duration`], which only happens for settings that skipped validation.
    pub fn policy(&self, reference: NaiveDateTime) -> Result<ReminderPolicy> {
        Duration::try_hours(self.due_soon_hours)
            .map(|window| ReminderPolicy::new(reference, window))
            .ok_or_else(|| {
                TaskError::Config(format!(
                    "reminders.due_soon_hours is out of range, got {}",
                    self.due_soon_hours
                ))
            })
    }
}

/// Terminal output options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Colour the reminder banner when writing to a terminal.
    pub color: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Config {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| TaskError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from `explicit` if given, else from the default location if a file
    /// exists there, else fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.reminders.due_soon_hours <= 0 {
            return Err(TaskError::Config(format!(
                "reminders.due_soon_hours must be positive, got {}",
                self.reminders.due_soon_hours
            )));
        }
        if self.reminders.due_soon_hours > MAX_DUE_SOON_HOURS {
            return Err(TaskError::Config(format!(
                "reminders.due_soon_hours must be at most {MAX_DUE_SOON_HOURS}, got {}",
                self.reminders.due_soon_hours
            )));
        }
        Ok(())
    }
}

/// `$HOME/.todo/config.toml`, when `HOME` is set.
pub fn default_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".todo").join("config.toml"))
}
