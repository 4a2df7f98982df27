//! Configuration module
//!
//! Handles the acquisition policy, the login command line and Twilio
//! endpoint settings loaded from TOML, plus credentials resolved at startup.

use crate::otp::selector::{DEFAULT_FRESHNESS_WINDOW_SECS, DEFAULT_MARKER_PHRASE};
use crate::sms::twilio::DEFAULT_API_BASE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod credentials;
pub mod toml_config;

pub use credentials::Credentials;

/// Timing and filtering rules for the OTP acquisition loop
///
/// Immutable once loaded; the loop receives it by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionPolicy {
    /// How long to let the login process finish on its own before polling
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,

    /// Pause between two fetches
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Overall budget, measured from process launch
    #[serde(default = "default_overall_timeout")]
    pub overall_timeout_secs: u64,

    /// Maximum age of a message that can still be delivered
    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: u64,

    /// Whole days before today (UTC) included in each fetch
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Sender filter passed to the provider
    #[serde(default = "default_sender_filter")]
    pub sender_filter: String,

    /// Phrase identifying a verification text (matched case-insensitively)
    #[serde(default = "default_marker_phrase")]
    pub marker_phrase: String,

    /// Maximum number of messages per fetch
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

fn default_grace_period() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    1000
}
fn default_overall_timeout() -> u64 {
    300
}
fn default_freshness_window() -> u64 {
    DEFAULT_FRESHNESS_WINDOW_SECS
}
fn default_lookback_days() -> u32 {
    1
}
fn default_sender_filter() -> String {
    "Apple".to_string()
}
fn default_marker_phrase() -> String {
    DEFAULT_MARKER_PHRASE.to_string()
}
fn default_fetch_limit() -> usize {
    50
}

impl Default for AcquisitionPolicy {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period(),
            poll_interval_ms: default_poll_interval(),
            overall_timeout_secs: default_overall_timeout(),
            freshness_window_secs: default_freshness_window(),
            lookback_days: default_lookback_days(),
            sender_filter: default_sender_filter(),
            marker_phrase: default_marker_phrase(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

impl AcquisitionPolicy {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// Validate the entire policy
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all fields are valid
    /// * `Err(PolicyValidationError)` with the first validation error encountered
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.grace_period_secs > 600 {
            return Err(PolicyValidationError::InvalidGracePeriod(
                self.grace_period_secs,
            ));
        }
        if !(100..=60_000).contains(&self.poll_interval_ms) {
            return Err(PolicyValidationError::InvalidPollInterval(
                self.poll_interval_ms,
            ));
        }
        if !(1..=3600).contains(&self.overall_timeout_secs) {
            return Err(PolicyValidationError::InvalidOverallTimeout(
                self.overall_timeout_secs,
            ));
        }
        if !(1..=3600).contains(&self.freshness_window_secs) {
            return Err(PolicyValidationError::InvalidFreshnessWindow(
                self.freshness_window_secs,
            ));
        }
        if self.lookback_days > 30 {
            return Err(PolicyValidationError::InvalidLookback(self.lookback_days));
        }
        if self.sender_filter.trim().is_empty() {
            return Err(PolicyValidationError::EmptyField("sender_filter"));
        }
        if self.marker_phrase.trim().is_empty() {
            return Err(PolicyValidationError::EmptyField("marker_phrase"));
        }
        if !(1..=1000).contains(&self.fetch_limit) {
            return Err(PolicyValidationError::InvalidFetchLimit(self.fetch_limit));
        }
        Ok(())
    }
}

/// Login command launched by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Executable resolved on PATH
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the Apple ID
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_program() -> String {
    "fastlane".to_string()
}
fn default_args() -> Vec<String> {
    vec!["spaceauth".to_string(), "-u".to_string()]
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

impl CommandConfig {
    /// Full argument list for a login as `apple_id`
    pub fn args_for(&self, apple_id: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(apple_id.to_string());
        args
    }
}

/// Twilio endpoint settings (credentials are resolved separately)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwilioSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for TwilioSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl TwilioSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Validation errors for AcquisitionPolicy
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyValidationError {
    #[error("grace_period_secs must be at most 600, got: {0}")]
    InvalidGracePeriod(u64),

    #[error("poll_interval_ms must be between 100 and 60000, got: {0}")]
    InvalidPollInterval(u64),

    #[error("overall_timeout_secs must be between 1 and 3600, got: {0}")]
    InvalidOverallTimeout(u64),

    #[error("freshness_window_secs must be between 1 and 3600, got: {0}")]
    InvalidFreshnessWindow(u64),

    #[error("lookback_days must be at most 30, got: {0}")]
    InvalidLookback(u32),

    #[error("fetch_limit must be between 1 and 1000, got: {0}")]
    InvalidFetchLimit(usize),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = AcquisitionPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.grace_period(), Duration::from_secs(10));
        assert_eq!(policy.poll_interval(), Duration::from_secs(1));
        assert_eq!(policy.freshness_window(), Duration::from_secs(120));
        assert_eq!(policy.fetch_limit, 50);
        assert_eq!(policy.sender_filter, "Apple");
    }

    #[test]
    fn test_invalid_policies() {
        let invalid = vec![
            AcquisitionPolicy {
                poll_interval_ms: 10,
                ..Default::default()
            },
            AcquisitionPolicy {
                overall_timeout_secs: 0,
                ..Default::default()
            },
            AcquisitionPolicy {
                freshness_window_secs: 0,
                ..Default::default()
            },
            AcquisitionPolicy {
                marker_phrase: "  ".to_string(),
                ..Default::default()
            },
            AcquisitionPolicy {
                fetch_limit: 0,
                ..Default::default()
            },
        ];

        for policy in invalid {
            assert!(policy.validate().is_err(), "{:?}", policy);
        }
    }

    #[test]
    fn test_command_args_for() {
        let command = CommandConfig::default();
        assert_eq!(
            command.args_for("dev@example.com"),
            vec!["spaceauth", "-u", "dev@example.com"]
        );
    }
}
