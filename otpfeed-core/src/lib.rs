//! Core library for the otpfeed 2FA relay
//!
//! This crate reads SMS verification codes from Twilio and feeds them to a
//! waiting `fastlane spaceauth` login.

pub mod error;
pub mod types;

pub mod acquisition;
pub mod config;
pub mod otp;
pub mod process;
pub mod sms;

use tracing::level_filters::LevelFilter;

/// Initialize logging infrastructure
///
/// Sets up tracing with systemd journal logging when running under systemd.
/// Otherwise logs to stderr, leaving stdout to the login process.
pub fn init_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            let journal_layer = tracing_journald::layer()?;
            tracing_subscriber::registry()
                .with(journal_layer)
                .with(level)
                .try_init()?;
            return Ok(());
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(level)
        .try_init()?;

    Ok(())
}
