//! Print the most recent inbound SMS
//!
//! Diagnostic mode for checking that Twilio credentials work and that
//! texts reach the number.

use super::{message_source, prepare, RunOptions};
use otpfeed_core::error::OtpFeedError;
use otpfeed_core::sms::{latest_inbound, MessageQuery, MessageSource};

/// Run the print-last-message mode
///
/// Outputs only the message body to stdout. Errors are sent to stderr.
pub async fn run_print_last_message(options: RunOptions) -> Result<(), OtpFeedError> {
    let (config, credentials) = prepare(options)?;
    let source = message_source(&config, &credentials)?;

    let query = MessageQuery {
        sent_after: None,
        sender: None,
        limit: config.acquisition.fetch_limit,
    };
    let messages = source.fetch(&query).await?;

    match latest_inbound(&messages) {
        Some(message) => println!("{}", message.body),
        None => println!("No messages found."),
    }

    Ok(())
}
