//! Type definitions and wrappers for secure data handling
//!
//! This module provides type-safe wrappers for sensitive data using the
//! secrecy crate to prevent accidental exposure in logs or debug output.

use secrecy::{ExposeSecret, Secret};

/// Length of the numeric verification codes relayed to the login process
pub const CODE_LENGTH: usize = 6;

/// Wrapper for a 6-digit SMS verification code
///
/// Codes are short lived but still grant a login, so they are kept out of
/// debug output and logs.
#[derive(Clone, Debug)]
pub struct VerificationCode(Secret<String>);

impl VerificationCode {
    /// Create a new VerificationCode, validating the format
    ///
    /// Returns `None` unless the value is exactly six ASCII digits.
    pub fn new(code: String) -> Option<Self> {
        if code.len() != CODE_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(Secret::new(code)))
    }

    /// Expose the code value (use with caution!)
    ///
    /// This should only be called when writing the code to the
    /// authentication process.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for VerificationCode {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for VerificationCode {}

/// Wrapper for passwords and API tokens read at startup
#[derive(Clone, Debug)]
pub struct SecretValue(Secret<String>);

impl SecretValue {
    pub fn new(value: String) -> Self {
        Self(Secret::new(value))
    }

    /// Expose the secret value (use with caution!)
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_code_accepts_six_digits() {
        let code = VerificationCode::new("482913".to_string()).unwrap();
        assert_eq!(code.expose(), "482913");
    }

    #[test]
    fn test_verification_code_rejects_bad_format() {
        for bad in ["12345", "1234567", "12a456", "", "１２３４５６"] {
            assert!(VerificationCode::new(bad.to_string()).is_none(), "{bad}");
        }
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let code = VerificationCode::new("482913".to_string()).unwrap();
        let token = SecretValue::new("twilio-token".to_string());

        assert!(!format!("{:?}", code).contains("482913"));
        assert!(!format!("{:?}", token).contains("twilio-token"));
    }
}
