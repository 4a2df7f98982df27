//! Authentication process module
//!
//! Launches the login CLI and feeds it the verification code.

pub mod child;
pub mod sink;

// Public re-exports
pub use child::ChildProcessSink;
pub use sink::ProcessSink;
