//! TOML configuration file I/O
//!
//! Loads the optional relay configuration from the user's configuration
//! directory. Secrets never live in this file.

use crate::config::{AcquisitionPolicy, CommandConfig, TwilioSettings};
use crate::error::{ConfigError, OtpFeedError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Complete TOML configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Acquisition timing and filters
    #[serde(default)]
    pub acquisition: AcquisitionPolicy,

    /// Login command line
    #[serde(default)]
    pub command: CommandConfig,

    /// Twilio endpoint settings
    #[serde(default)]
    pub twilio: TwilioSettings,
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, OtpFeedError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OtpFeedError::Config(ConfigError::LoadFailed {
                path: path.to_string_lossy().to_string(),
            }),
            _ => OtpFeedError::Config(ConfigError::IoError {
                message: format!("Failed to read config file: {}", e),
            }),
        })?;

        let config: TomlConfig = toml::from_str(&contents)?;
        config.validate()?;

        info!(
            "Loaded configuration: grace={}s, poll={}ms, timeout={}s, freshness={}s, program={}",
            config.acquisition.grace_period_secs,
            config.acquisition.poll_interval_ms,
            config.acquisition.overall_timeout_secs,
            config.acquisition.freshness_window_secs,
            config.command.program
        );

        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.acquisition
            .validate()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("Invalid acquisition policy: {}", e),
            })?;

        if self.command.program.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "command.program cannot be empty".to_string(),
            });
        }

        if self.twilio.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "twilio.request_timeout_secs cannot be zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/otpfeed, or OTPFEED_CONFIG_DIR environment variable if set
pub fn get_config_dir() -> Result<PathBuf, OtpFeedError> {
    if let Ok(config_dir) = std::env::var("OTPFEED_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        OtpFeedError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("otpfeed"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, OtpFeedError> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, or from the default location
///
/// An explicitly given file must exist. A missing default file yields the
/// built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig, OtpFeedError> {
    if let Some(path) = path {
        return TomlConfig::from_file(path);
    }

    let default_path = get_config_path()?;
    if default_path.exists() {
        TomlConfig::from_file(&default_path)
    } else {
        debug!(
            "No configuration file at {:?}, using defaults",
            default_path
        );
        Ok(TomlConfig::default())
    }
}
