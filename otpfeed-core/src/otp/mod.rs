//! Verification code module
//!
//! Extracts codes from message text, picks the one message that answers
//! the current login attempt, and remembers what was already delivered.

pub mod extractor;
pub mod selector;
pub mod tracker;

// Public re-exports
pub use extractor::CodeExtractor;
pub use selector::{Candidate, CandidateSelector};
pub use tracker::ConsumptionTracker;
