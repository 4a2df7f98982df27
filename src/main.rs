//! otpfeed - fastlane 2FA relay
//!
//! Runs `fastlane spaceauth` and answers its two-factor prompt with the
//! verification code texted to a Twilio number.

use clap::Parser;
use otpfeed_core::error::CONFIG_FAILURE_EXIT_CODE;
use otpfeed_core::init_logging;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

mod cli;

#[derive(Parser)]
#[command(name = "otpfeed")]
#[command(about = "Complete fastlane 2FA logins with SMS codes received through Twilio")]
#[command(
    long_about = "Complete fastlane 2FA logins with SMS codes received through Twilio.\n\n\
Each positional value can instead be supplied through its environment variable, \
which takes precedence when set."
)]
struct Cli {
    /// Apple ID to log in with [env: FASTLANE_USER]
    apple_id: Option<String>,

    /// Apple ID password [env: FASTLANE_PASSWORD]
    apple_password: Option<String>,

    /// Phone number Apple texts the code to [env: SPACESHIP_2FA_SMS_DEFAULT_PHONE_NUMBER]
    phone_number: Option<String>,

    /// Twilio account SID [env: 2FA_TWILIO_ACCOUNT_SID]
    twilio_account_sid: Option<String>,

    /// Twilio auth token [env: 2FA_TWILIO_AUTH_TOKEN]
    twilio_auth_token: Option<String>,

    /// Configuration file (default: ~/.config/otpfeed/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Give up if no code arrives within this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Seconds to let fastlane finish before looking for a code
    #[arg(long, value_name = "SECS")]
    grace: Option<u64>,

    /// Milliseconds between two message fetches
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Print the most recent inbound SMS and exit
    #[arg(long)]
    print_last_message: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    if let Err(e) = init_logging(level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(CONFIG_FAILURE_EXIT_CODE);
    }

    let options = cli::RunOptions {
        credentials: otpfeed_core::config::credentials::CredentialArgs {
            apple_id: cli.apple_id,
            apple_password: cli.apple_password,
            phone_number: cli.phone_number,
            twilio_account_sid: cli.twilio_account_sid,
            twilio_auth_token: cli.twilio_auth_token,
        },
        config_path: cli.config,
        timeout_secs: cli.timeout,
        grace_secs: cli.grace,
        poll_interval_ms: cli.poll_interval_ms,
    };

    let result = if cli.print_last_message {
        cli::last_message::run_print_last_message(options).await
    } else {
        cli::login::run_login(options).await
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
