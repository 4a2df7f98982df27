//! Acquisition state machine and outcomes

use crate::error::{OtpFeedError, ProcessError};
use crate::types::VerificationCode;
use std::time::Duration;
use tokio::time::Instant;

/// States of one acquisition run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionState {
    /// Launching the login process
    Starting,

    /// Giving the login process a chance to finish without 2FA
    GraceWait,

    /// Polling the SMS provider
    Polling {
        /// Fetch attempt number (1-indexed)
        attempt: u32,
    },

    /// A code was written to the login process
    Delivered,

    /// The login process succeeded without a code
    NotRequired,

    /// No eligible code arrived before the deadline
    TimedOut,

    /// The login process exited with a failure status
    ProcessFailed { exit_code: i32 },

    /// Unrecoverable provider or process error
    FatalError { reason: String },

    /// Stopped on request
    Cancelled,
}

impl AcquisitionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            AcquisitionState::Starting
                | AcquisitionState::GraceWait
                | AcquisitionState::Polling { .. }
        )
    }
}

impl std::fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquisitionState::Starting => write!(f, "starting"),
            AcquisitionState::GraceWait => write!(f, "grace wait"),
            AcquisitionState::Polling { attempt } => write!(f, "polling (attempt {})", attempt),
            AcquisitionState::Delivered => write!(f, "delivered"),
            AcquisitionState::NotRequired => write!(f, "not required"),
            AcquisitionState::TimedOut => write!(f, "timed out"),
            AcquisitionState::ProcessFailed { exit_code } => {
                write!(f, "process failed ({})", exit_code)
            }
            AcquisitionState::FatalError { reason } => write!(f, "fatal error: {}", reason),
            AcquisitionState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Bookkeeping for a single run
#[derive(Debug, Clone)]
pub struct LoopState {
    pub started_at: Instant,
    pub deadline: Instant,
    /// Set exactly once; no fetch or write happens afterwards
    pub delivered_code: Option<VerificationCode>,
    /// Number of fetches issued
    pub polls: u32,
}

impl LoopState {
    pub fn new(started_at: Instant, timeout: Duration) -> Self {
        Self {
            started_at,
            deadline: started_at + timeout,
            delivered_code: None,
            polls: 0,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// How a run ended
#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// The code was written to the login process
    Delivered(VerificationCode),

    /// The login process finished successfully on its own
    NotRequired,

    /// The run failed; see the error for the reason
    Failed(OtpFeedError),
}

impl AcquisitionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, AcquisitionOutcome::Failed(_))
    }

    /// Exit status the host should report
    pub fn exit_code(&self) -> i32 {
        match self {
            AcquisitionOutcome::Delivered(_) | AcquisitionOutcome::NotRequired => 0,
            AcquisitionOutcome::Failed(error) => error.exit_code(),
        }
    }

    /// Terminal state matching this outcome
    pub fn terminal_state(&self) -> AcquisitionState {
        match self {
            AcquisitionOutcome::Delivered(_) => AcquisitionState::Delivered,
            AcquisitionOutcome::NotRequired => AcquisitionState::NotRequired,
            AcquisitionOutcome::Failed(OtpFeedError::Timeout { .. }) => AcquisitionState::TimedOut,
            AcquisitionOutcome::Failed(OtpFeedError::Cancelled) => AcquisitionState::Cancelled,
            AcquisitionOutcome::Failed(OtpFeedError::Process(ProcessError::Exited { code })) => {
                AcquisitionState::ProcessFailed { exit_code: *code }
            }
            AcquisitionOutcome::Failed(error) => AcquisitionState::FatalError {
                reason: error.to_string(),
            },
        }
    }
}
