mod config;

pub use config::{
    AlarmConfig, AlertsConfig, ClockConfig, Config, DesktopConfig, EventConfig, PushConfig,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `ROASTPLAN_DATA_DIR` wins when set. Otherwise `~/.config/roastplan[-dev]/`
/// based on `ROASTPLAN_ENV`; set `ROASTPLAN_ENV=dev` for the development
/// directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("ROASTPLAN_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ROASTPLAN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("roastplan-dev")
            } else {
                base_dir.join("roastplan")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
