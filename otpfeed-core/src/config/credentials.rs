//! Credentials resolved from the environment and positional arguments

use crate::error::ConfigError;
use crate::types::SecretValue;

pub const ENV_APPLE_ID: &str = "FASTLANE_USER";
pub const ENV_APPLE_PASSWORD: &str = "FASTLANE_PASSWORD";
pub const ENV_PHONE_NUMBER: &str = "SPACESHIP_2FA_SMS_DEFAULT_PHONE_NUMBER";
pub const ENV_TWILIO_ACCOUNT_SID: &str = "2FA_TWILIO_ACCOUNT_SID";
pub const ENV_TWILIO_AUTH_TOKEN: &str = "2FA_TWILIO_AUTH_TOKEN";

/// Everything needed to log in and read the verification texts
#[derive(Debug, Clone)]
pub struct Credentials {
    pub apple_id: String,
    pub apple_password: SecretValue,
    /// Number fastlane asks Apple to text; only forwarded to the login process
    pub phone_number: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: SecretValue,
}

/// Positional values given on the command line, in declaration order
#[derive(Debug, Clone, Default)]
pub struct CredentialArgs {
    pub apple_id: Option<String>,
    pub apple_password: Option<String>,
    pub phone_number: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
}

impl Credentials {
    /// Resolve credentials from the process environment and `args`
    pub fn resolve(args: CredentialArgs) -> Result<Self, ConfigError> {
        Self::resolve_with(args, |name| std::env::var(name).ok())
    }

    /// Resolve credentials using `lookup` for environment variables
    ///
    /// A non-blank environment variable wins over the positional argument.
    /// Every value is required.
    pub fn resolve_with<F>(args: CredentialArgs, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str, arg: Option<String>| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .or(arg.filter(|value| !value.trim().is_empty()))
                .ok_or_else(|| ConfigError::MissingField {
                    field: name.to_string(),
                })
        };

        Ok(Self {
            apple_id: pick(ENV_APPLE_ID, args.apple_id)?,
            apple_password: pick(ENV_APPLE_PASSWORD, args.apple_password)?.into(),
            phone_number: pick(ENV_PHONE_NUMBER, args.phone_number)?,
            twilio_account_sid: pick(ENV_TWILIO_ACCOUNT_SID, args.twilio_account_sid)?,
            twilio_auth_token: pick(ENV_TWILIO_AUTH_TOKEN, args.twilio_auth_token)?.into(),
        })
    }

    /// Environment the login process needs to run unattended
    pub fn login_environment(&self) -> Vec<(&'static str, SecretValue)> {
        vec![
            (ENV_APPLE_ID, SecretValue::new(self.apple_id.clone())),
            (ENV_APPLE_PASSWORD, self.apple_password.clone()),
            (ENV_PHONE_NUMBER, SecretValue::new(self.phone_number.clone())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_args() -> CredentialArgs {
        CredentialArgs {
            apple_id: Some("arg@example.com".to_string()),
            apple_password: Some("arg-password".to_string()),
            phone_number: Some("+15550100".to_string()),
            twilio_account_sid: Some("ACarg".to_string()),
            twilio_auth_token: Some("arg-token".to_string()),
        }
    }

    #[test]
    fn test_resolve_from_args() {
        let credentials = Credentials::resolve_with(full_args(), |_| None).unwrap();
        assert_eq!(credentials.apple_id, "arg@example.com");
        assert_eq!(credentials.twilio_auth_token.expose(), "arg-token");
    }

    #[test]
    fn test_environment_wins_over_args() {
        let env: HashMap<&str, &str> = [
            (ENV_APPLE_ID, "env@example.com"),
            (ENV_TWILIO_ACCOUNT_SID, "   "),
        ]
        .into_iter()
        .collect();

        let credentials =
            Credentials::resolve_with(full_args(), |name| env.get(name).map(|v| v.to_string()))
                .unwrap();
        assert_eq!(credentials.apple_id, "env@example.com");
        // Blank environment values fall back to the argument
        assert_eq!(credentials.twilio_account_sid, "ACarg");
    }

    #[test]
    fn test_missing_value_is_reported() {
        let args = CredentialArgs {
            twilio_auth_token: None,
            ..full_args()
        };
        let result = Credentials::resolve_with(args, |_| None);
        match result {
            Err(ConfigError::MissingField { field }) => assert_eq!(field, ENV_TWILIO_AUTH_TOKEN),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_login_environment() {
        let credentials = Credentials::resolve_with(full_args(), |_| None).unwrap();
        let env = credentials.login_environment();
        let names: Vec<&str> = env.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec![ENV_APPLE_ID, ENV_APPLE_PASSWORD, ENV_PHONE_NUMBER]);
        assert_eq!(env[1].1.expose(), "arg-password");
    }
}
