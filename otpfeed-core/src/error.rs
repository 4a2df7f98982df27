//! Error types for the otpfeed 2FA relay
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Exit status used when no code could be acquired (timeout or fatal fetch error)
pub const ACQUISITION_FAILURE_EXIT_CODE: i32 = 3;

/// Exit status used for missing or invalid configuration
pub const CONFIG_FAILURE_EXIT_CODE: i32 = 2;

/// Exit status used when the relay is interrupted
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Main error type for the otpfeed application
#[derive(Error, Debug)]
pub enum OtpFeedError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors talking to the SMS provider
    #[error("Message fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Errors related to the authentication process
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// No usable verification code arrived in time
    #[error("No verification code received within {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Acquisition was cancelled before a code was delivered
    #[error("Verification code relay cancelled")]
    Cancelled,

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl OtpFeedError {
    /// Map the error to the exit status reported by the CLI
    ///
    /// A failed authentication process propagates its own exit code verbatim.
    pub fn exit_code(&self) -> i32 {
        match self {
            OtpFeedError::Config(_) | OtpFeedError::Toml(_) => CONFIG_FAILURE_EXIT_CODE,
            OtpFeedError::Process(ProcessError::Exited { code }) => *code,
            OtpFeedError::Process(_) | OtpFeedError::Io(_) => 1,
            OtpFeedError::Fetch(_) | OtpFeedError::Timeout { .. } => ACQUISITION_FAILURE_EXIT_CODE,
            OtpFeedError::Cancelled => CANCELLED_EXIT_CODE,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// SMS provider fetch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network hiccup, provider 5xx or rate limiting; worth retrying
    #[error("Transient provider error: {reason}")]
    Transient { reason: String },

    /// Bad credentials or a request the provider will never accept
    #[error("Provider rejected request: {reason}")]
    Fatal { reason: String },
}

impl FetchError {
    /// Whether the caller should retry after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }
}

/// Authentication process errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Executable not found on PATH: {program}")]
    NotFound { program: String },

    #[error("Failed to spawn process: {reason}")]
    SpawnFailed { reason: String },

    #[error("Process exited with status {code}")]
    Exited { code: i32 },

    #[error("Process stdin is not available")]
    StdinUnavailable,

    #[error("Failed to write to process stdin: {reason}")]
    WriteFailed { reason: String },

    #[error("Failed to query process status: {reason}")]
    StatusUnavailable { reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, OtpFeedError>;
