//! OTP acquisition module
//!
//! Orchestrates polling, selection and delivery for one login attempt.

pub mod runner;
pub mod state;

// Public re-exports
pub use runner::{AcquisitionReport, CancellationHandle, OtpAcquisitionLoop};
pub use state::{AcquisitionOutcome, AcquisitionState, LoopState};
