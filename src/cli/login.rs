//! Login relay command
//!
//! Runs the login process and feeds it the SMS verification code.

use super::{message_source, prepare, RunOptions};
use otpfeed_core::acquisition::{AcquisitionOutcome, AcquisitionReport, OtpAcquisitionLoop};
use otpfeed_core::error::{OtpFeedError, ProcessError, CANCELLED_EXIT_CODE};
use otpfeed_core::process::ChildProcessSink;
use tracing::{info, warn};

/// Run the login relay
///
/// Spawns the acquisition loop as a single task and waits for its terminal
/// state. After a delivery, waits for the login process to finish so its
/// session is saved before we exit.
pub async fn run_login(options: RunOptions) -> Result<(), OtpFeedError> {
    let (config, credentials) = prepare(options)?;
    let source = message_source(&config, &credentials)?;

    let sink = credentials.login_environment().into_iter().fold(
        ChildProcessSink::new(
            config.command.program.clone(),
            config.command.args_for(&credentials.apple_id),
        ),
        |sink, (name, value)| sink.env(name, value),
    );

    info!("Starting {} {}", sink.program(), sink.args().join(" "));

    let acquisition = OtpAcquisitionLoop::new(config.acquisition.clone(), source, sink);

    let cancel = acquisition.cancellation_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if cancel.is_cancelled() {
                // Second interrupt while the loop is still winding down
                warn!("Interrupted again, exiting immediately");
                std::process::exit(CANCELLED_EXIT_CODE);
            }
            warn!("Interrupt received, stopping");
            cancel.cancel();
        }
    });

    let AcquisitionReport {
        outcome, mut sink, ..
    } = tokio::spawn(acquisition.run())
        .await
        .map_err(|e| OtpFeedError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    match outcome {
        AcquisitionOutcome::Delivered(_) => {
            info!(
                pid = ?sink.id(),
                "Code delivered, waiting for {} to finish",
                sink.program()
            );
            match sink.wait().await {
                Ok(0) => info!("Login completed"),
                Ok(code) => warn!(exit_code = code, "Login process failed after code delivery"),
                Err(e) => warn!("Could not wait for login process: {}", e),
            }
            Ok(())
        }
        AcquisitionOutcome::NotRequired => {
            info!("Login completed without a verification code");
            Ok(())
        }
        AcquisitionOutcome::Failed(error) => {
            // A login still waiting for a code would block forever
            if !matches!(error, OtpFeedError::Process(ProcessError::Exited { .. })) {
                if let Err(e) = sink.terminate() {
                    warn!("Failed to stop login process: {}", e);
                }
            }
            Err(error)
        }
    }
}
