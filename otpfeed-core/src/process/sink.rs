//! Contract between the acquisition loop and the login process

use crate::error::ProcessError;
use async_trait::async_trait;

/// A process that may need one line of input to finish logging in
///
/// The process can resolve on its own at any time (for example when the
/// session is already trusted), so callers check [`ProcessSink::try_exit_code`]
/// before writing.
#[async_trait]
pub trait ProcessSink: Send {
    /// Launch the process
    async fn start(&mut self) -> Result<(), ProcessError>;

    /// Exit code if the process has already exited, `None` while it runs
    fn try_exit_code(&mut self) -> Result<Option<i32>, ProcessError>;

    /// Write `line` plus a line terminator to the process's stdin
    async fn write_line(&mut self, line: &str) -> Result<(), ProcessError>;
}
