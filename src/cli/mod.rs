//! CLI command implementations
//!
//! Resolves configuration and credentials, then runs the selected mode.

pub mod last_message;
pub mod login;

use otpfeed_core::config::credentials::CredentialArgs;
use otpfeed_core::config::toml_config::{load_config, TomlConfig};
use otpfeed_core::config::Credentials;
use otpfeed_core::error::OtpFeedError;
use otpfeed_core::sms::TwilioMessageSource;
use std::path::PathBuf;

/// Options collected from the command line
pub struct RunOptions {
    pub credentials: CredentialArgs,
    pub config_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub grace_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

/// Load the configuration file and apply command-line overrides
fn resolve_config(options: &RunOptions) -> Result<TomlConfig, OtpFeedError> {
    let mut config = load_config(options.config_path.as_deref())?;

    if let Some(timeout) = options.timeout_secs {
        config.acquisition.overall_timeout_secs = timeout;
    }
    if let Some(grace) = options.grace_secs {
        config.acquisition.grace_period_secs = grace;
    }
    if let Some(interval) = options.poll_interval_ms {
        config.acquisition.poll_interval_ms = interval;
    }

    config.validate()?;
    Ok(config)
}

/// Resolve everything a run needs
fn prepare(options: RunOptions) -> Result<(TomlConfig, Credentials), OtpFeedError> {
    let config = resolve_config(&options)?;
    let credentials = Credentials::resolve(options.credentials)?;
    Ok((config, credentials))
}

fn message_source(
    config: &TomlConfig,
    credentials: &Credentials,
) -> Result<TwilioMessageSource, OtpFeedError> {
    let source = TwilioMessageSource::new(
        &config.twilio.api_base,
        credentials.twilio_account_sid.clone(),
        credentials.twilio_auth_token.clone(),
        config.twilio.request_timeout(),
    )?;
    Ok(source)
}
