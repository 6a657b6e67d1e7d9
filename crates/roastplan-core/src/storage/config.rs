//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Serve time and an optional recipe table path
//! - Whether alerts are enabled, and the alert window
//! - Which delivery sinks are active (push relay, desktop, terminal bell)
//! - Live clock cadence
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::alerts::{AlertWindow, DEFAULT_PUSH_SERVER, DEFAULT_PUSH_TOPIC};
use crate::clock::{deadline_today, parse_serve_time, CadenceSettings};
use crate::error::{ConfigError, CoreError};

/// The meal being planned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Serve time, `HH:MM` local.
    #[serde(default = "default_serve_at")]
    pub serve_at: String,
    /// Recipe table to load instead of the built-in one.
    #[serde(default)]
    pub recipes_path: Option<String>,
}

/// Reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Fire this many seconds before an event.
    #[serde(default = "default_lead")]
    pub lead_secs: u64,
    /// Still fire this many seconds after an event.
    #[serde(default = "default_grace")]
    pub grace_secs: u64,
}

/// Push relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_push_server")]
    pub server: String,
    #[serde(default = "default_push_topic")]
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Live clock cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_fine")]
    pub fine_secs: u64,
    #[serde(default = "default_coarse")]
    pub coarse_secs: u64,
    #[serde(default = "default_observe")]
    pub observe_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub desktop: DesktopConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub clock: ClockConfig,
}

// Default functions
fn default_serve_at() -> String {
    "15:00".into()
}
fn default_poll_interval() -> u64 {
    30
}
fn default_lead() -> u64 {
    120
}
fn default_grace() -> u64 {
    60
}
fn default_push_server() -> String {
    DEFAULT_PUSH_SERVER.into()
}
fn default_push_topic() -> String {
    DEFAULT_PUSH_TOPIC.into()
}
fn default_true() -> bool {
    true
}
fn default_fine() -> u64 {
    1
}
fn default_coarse() -> u64 {
    60
}
fn default_observe() -> u64 {
    300
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            serve_at: default_serve_at(),
            recipes_path: None,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: default_poll_interval(),
            lead_secs: default_lead(),
            grace_secs: default_grace(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: default_push_server(),
            topic: default_push_topic(),
        }
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fine_secs: default_fine(),
            coarse_secs: default_coarse(),
            observe_secs: default_observe(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|e| invalid(e.to_string()))?,
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("not a single value".into()))
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn flatten_into(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::flatten_into(&key, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            serde_json::Value::Null => out.push((prefix.to_string(), String::new())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// as the key's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let next: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Every leaf key with its value, in section order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::flatten_into("", &json, &mut out);
        }
        out
    }

    /// Check values a hand-edited file could get wrong.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_serve_time(&self.event.serve_at)?;
        if self.alerts.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "alerts.poll_interval_secs".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.clock.fine_secs == 0 || self.clock.coarse_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "clock".into(),
                message: "tick intervals must be at least 1 second".into(),
            });
        }
        Ok(())
    }

    pub fn serve_time(&self) -> Result<NaiveTime, ConfigError> {
        parse_serve_time(&self.event.serve_at)
    }

    /// Today's deadline at `serve_at`, or at the configured serve time.
    ///
    /// # Errors
    ///
    /// Returns an error if the time does not parse or falls in a local
    /// clock gap today.
    pub fn deadline(&self, serve_at: Option<&str>) -> crate::error::Result<DateTime<Utc>> {
        let time = match serve_at {
            Some(value) => parse_serve_time(value)?,
            None => self.serve_time()?,
        };
        deadline_today(time).ok_or(CoreError::NoSuchLocalTime(time))
    }

    pub fn recipes_path(&self) -> Option<&Path> {
        self.event
            .recipes_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(Path::new)
    }

    pub fn alert_window(&self) -> AlertWindow {
        AlertWindow::from_secs(self.alerts.lead_secs, self.alerts.grace_secs)
    }

    pub fn poll_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.alerts.poll_interval_secs.max(1))
    }

    pub fn cadence(&self) -> CadenceSettings {
        CadenceSettings {
            fine: StdDuration::from_secs(self.clock.fine_secs.max(1)),
            coarse: StdDuration::from_secs(self.clock.coarse_secs.max(1)),
            observe: StdDuration::from_secs(self.clock.observe_secs),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
