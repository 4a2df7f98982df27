//! OTP acquisition loop
//!
//! Launches the login process, waits out the grace period, then polls the
//! SMS provider until one eligible code has been delivered, the process
//! resolves on its own, the deadline passes, or the run is cancelled.

use crate::acquisition::state::{AcquisitionOutcome, AcquisitionState, LoopState};
use crate::config::AcquisitionPolicy;
use crate::error::{OtpFeedError, ProcessError};
use crate::otp::{Candidate, CandidateSelector, ConsumptionTracker};
use crate::process::ProcessSink;
use crate::sms::{MessageQuery, MessageSource};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Requests cancellation of a running acquisition
///
/// Cancellation stops the loop before its next fetch or sleep ends; a write
/// already in progress is allowed to finish.
#[derive(Debug, Clone)]
pub struct CancellationHandle(Arc<watch::Sender<bool>>);

impl CancellationHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// Result of a finished run
#[derive(Debug)]
pub struct AcquisitionReport<P> {
    pub outcome: AcquisitionOutcome,
    pub state: LoopState,
    /// The login process, handed back so the host can wait on or kill it
    pub sink: P,
}

/// Drives one login attempt from launch to a terminal state
pub struct OtpAcquisitionLoop<S, P> {
    policy: AcquisitionPolicy,
    source: S,
    sink: P,
    selector: CandidateSelector,
    tracker: ConsumptionTracker,
    state_tx: watch::Sender<AcquisitionState>,
    state_rx: watch::Receiver<AcquisitionState>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl<S, P> OtpAcquisitionLoop<S, P>
where
    S: MessageSource,
    P: ProcessSink,
{
    /// Create a new acquisition loop
    ///
    /// # Arguments
    ///
    /// * `policy` - Timing and filtering rules, fixed for the whole run
    /// * `source` - Where verification texts are read from
    /// * `sink` - The login process waiting for a code (not yet started)
    pub fn new(policy: AcquisitionPolicy, source: S, sink: P) -> Self {
        let (state_tx, state_rx) = watch::channel(AcquisitionState::Starting);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let selector = CandidateSelector::new(&policy.marker_phrase, policy.freshness_window());

        Self {
            policy,
            source,
            sink,
            selector,
            tracker: ConsumptionTracker::new(),
            state_tx,
            state_rx,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    /// Get a receiver for state updates
    pub fn state_receiver(&self) -> watch::Receiver<AcquisitionState> {
        self.state_rx.clone()
    }

    /// Get a handle that cancels this run
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle(Arc::clone(&self.cancel_tx))
    }

    /// Run to completion
    ///
    /// Consumes the loop; spawn it as a task and await the handle to get
    /// the terminal outcome.
    #[tracing::instrument(skip(self), fields(timeout_secs = self.policy.overall_timeout_secs))]
    pub async fn run(mut self) -> AcquisitionReport<P> {
        let mut state = LoopState::new(Instant::now(), self.policy.overall_timeout());
        let outcome = self.drive(&mut state).await;

        let terminal = outcome.terminal_state();
        debug_assert!(terminal.is_terminal());
        match &outcome {
            AcquisitionOutcome::Failed(e) => warn!("Acquisition ended: {} ({})", terminal, e),
            _ => info!("Acquisition ended: {}", terminal),
        }
        self.transition(terminal);

        AcquisitionReport {
            outcome,
            state,
            sink: self.sink,
        }
    }

    async fn drive(&mut self, state: &mut LoopState) -> AcquisitionOutcome {
        let mut cancel_rx = self.cancel_rx.clone();

        self.transition(AcquisitionState::Starting);
        if let Err(e) = self.sink.start().await {
            error!("Failed to start login process: {}", e);
            return AcquisitionOutcome::Failed(e.into());
        }

        self.transition(AcquisitionState::GraceWait);
        if sleep_or_cancel(self.policy.grace_period(), &mut cancel_rx).await {
            return AcquisitionOutcome::Failed(OtpFeedError::Cancelled);
        }

        loop {
            if *cancel_rx.borrow() {
                return AcquisitionOutcome::Failed(OtpFeedError::Cancelled);
            }
            if let Some(outcome) = self.check_process() {
                return outcome;
            }

            state.polls += 1;
            self.transition(AcquisitionState::Polling {
                attempt: state.polls,
            });

            let query = self.query(Utc::now());
            let fetched = tokio::select! {
                biased;
                _ = cancelled(&mut cancel_rx) => {
                    return AcquisitionOutcome::Failed(OtpFeedError::Cancelled);
                }
                result = self.source.fetch(&query) => result,
            };

            match fetched {
                Ok(messages) => {
                    debug!(count = messages.len(), "Evaluating fetched messages");
                    if let Some(candidate) =
                        self.selector.select(&messages, &self.tracker, Utc::now())
                    {
                        return self.deliver(candidate, state).await;
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(attempt = state.polls, "Fetch failed, will retry: {}", e);
                }
                Err(e) => {
                    error!("Fetch failed permanently: {}", e);
                    return AcquisitionOutcome::Failed(e.into());
                }
            }

            if state.is_expired(Instant::now()) {
                return AcquisitionOutcome::Failed(OtpFeedError::Timeout {
                    seconds: self.policy.overall_timeout_secs,
                });
            }

            if sleep_or_cancel(self.policy.poll_interval(), &mut cancel_rx).await {
                return AcquisitionOutcome::Failed(OtpFeedError::Cancelled);
            }
        }
    }

    /// Write the candidate's code once
    async fn deliver(&mut self, candidate: Candidate, state: &mut LoopState) -> AcquisitionOutcome {
        // The process may have resolved while we were fetching
        if let Some(outcome) = self.check_process() {
            return outcome;
        }

        match self.sink.write_line(candidate.code.expose()).await {
            Ok(()) => {
                self.tracker.mark_consumed(&candidate);
                state.delivered_code = Some(candidate.code.clone());
                info!(
                    message_id = %candidate.message.id,
                    created_at = %candidate.message.created_at,
                    "Delivered verification code to login process"
                );
                AcquisitionOutcome::Delivered(candidate.code)
            }
            Err(e) => {
                if let Some(outcome) = self.check_process() {
                    return outcome;
                }
                error!("Failed to deliver verification code: {}", e);
                AcquisitionOutcome::Failed(e.into())
            }
        }
    }

    /// Terminal outcome if the login process has already exited
    fn check_process(&mut self) -> Option<AcquisitionOutcome> {
        match self.sink.try_exit_code() {
            Ok(None) => None,
            Ok(Some(0)) => {
                info!("Login process completed without needing a code");
                Some(AcquisitionOutcome::NotRequired)
            }
            Ok(Some(code)) => {
                warn!(exit_code = code, "Login process failed");
                Some(AcquisitionOutcome::Failed(
                    ProcessError::Exited { code }.into(),
                ))
            }
            Err(e) => Some(AcquisitionOutcome::Failed(e.into())),
        }
    }

    fn query(&self, now: DateTime<Utc>) -> MessageQuery {
        MessageQuery {
            sent_after: Some(fetch_window_start(now, self.policy.lookback_days)),
            sender: Some(self.policy.sender_filter.clone()),
            limit: self.policy.fetch_limit,
        }
    }

    fn transition(&self, next: AcquisitionState) {
        debug!("Acquisition state: {}", next);
        let _ = self.state_tx.send(next);
    }
}

/// Start of the current UTC day, `lookback_days` days back
pub fn fetch_window_start(now: DateTime<Utc>, lookback_days: u32) -> DateTime<Utc> {
    let midnight = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));
    midnight - chrono::Duration::days(i64::from(lookback_days))
}

/// Resolves once cancellation has been requested
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: nobody can cancel any more
            std::future::pending::<()>().await;
        }
    }
}

/// Sleep for `duration`; returns true if cancelled first
async fn sleep_or_cancel(duration: Duration, rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = cancelled(rx) => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_window_start_is_previous_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 42, 7).unwrap();
        assert_eq!(
            fetch_window_start(now, 1),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(
            fetch_window_start(now, 0),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_cancellation_handle_interrupts_sleep() {
        let (tx, mut rx) = watch::channel(false);
        let handle = CancellationHandle(Arc::new(tx));
        assert!(!handle.is_cancelled());

        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(sleep_or_cancel(Duration::from_secs(3600), &mut rx).await);
    }

    #[test]
    fn test_cancel_sticks_without_receivers() {
        let (tx, rx) = watch::channel(false);
        let handle = CancellationHandle(Arc::new(tx));
        drop(rx);

        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
