//! End-to-end tests of the otpfeed binary
//!
//! The login command is replaced by `sh` through the configuration file so
//! no fastlane installation or Twilio account is needed.

#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const CREDENTIAL_VARS: [&str; 5] = [
    "FASTLANE_USER",
    "FASTLANE_PASSWORD",
    "SPACESHIP_2FA_SMS_DEFAULT_PHONE_NUMBER",
    "2FA_TWILIO_ACCOUNT_SID",
    "2FA_TWILIO_AUTH_TOKEN",
];

/// Write `config.toml` into a fresh directory
fn config_dir(contents: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("config.toml"), contents).expect("Failed to write config");
    dir
}

/// Config running `sh -c <script>` as the login command
fn shell_login_config(script: &str) -> String {
    format!(
        "[command]\nprogram = \"sh\"\nargs = [\"-c\", \"{}\", \"sh\"]\n\n[twilio]\napi_base = \"http://127.0.0.1:1\"\nrequest_timeout_secs = 1\n",
        script
    )
}

fn otpfeed(config_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_otpfeed"));
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env("OTPFEED_CONFIG_DIR", config_dir);
    cmd
}

fn run_with_all_credentials(cmd: &mut Command) -> Output {
    cmd.args([
        "dev@example.com",
        "app-password",
        "+15550100",
        "AC123",
        "secret-token",
    ])
    .output()
    .expect("Failed to execute otpfeed")
}

#[test]
fn test_missing_credentials_exit_with_config_error() {
    let dir = config_dir("");

    let output = otpfeed(dir.path())
        .arg("dev@example.com")
        .output()
        .expect("Failed to execute otpfeed");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr);
    assert!(stderr.contains("FASTLANE_PASSWORD"));
}

#[test]
fn test_environment_supplies_credentials() {
    let dir = config_dir(&shell_login_config("exit 0"));

    let output = otpfeed(dir.path())
        .args(["--grace", "1"])
        .env("FASTLANE_USER", "dev@example.com")
        .env("FASTLANE_PASSWORD", "app-password")
        .env("SPACESHIP_2FA_SMS_DEFAULT_PHONE_NUMBER", "+15550100")
        .env("2FA_TWILIO_ACCOUNT_SID", "AC123")
        .env("2FA_TWILIO_AUTH_TOKEN", "secret-token")
        .output()
        .expect("Failed to execute otpfeed");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let dir = config_dir("[acquisition]\nfetch_limit = 0\n");

    let output = run_with_all_credentials(&mut otpfeed(dir.path()));

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_login_without_2fa_exits_zero() {
    let dir = config_dir(&shell_login_config("exit 0"));

    let output = run_with_all_credentials(otpfeed(dir.path()).args(["--grace", "1"]));

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_failed_login_propagates_exit_code() {
    let dir = config_dir(&shell_login_config("exit 4"));

    let output = run_with_all_credentials(otpfeed(dir.path()).args(["--grace", "1"]));

    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_login_receives_apple_id_and_environment() {
    // Exits 0 only if the Apple ID arrives as an argument and the
    // password through the environment
    let dir = config_dir(&shell_login_config(
        "[ \\\"$1\\\" = dev@example.com ] && [ \\\"$FASTLANE_PASSWORD\\\" = app-password ]",
    ));

    let output = run_with_all_credentials(otpfeed(dir.path()).args(["--grace", "1"]));

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_missing_login_program() {
    let dir = config_dir(
        "[command]\nprogram = \"definitely-not-a-real-binary-otpfeed\"\n\n[twilio]\napi_base = \"http://127.0.0.1:1\"\n",
    );

    let output = run_with_all_credentials(&mut otpfeed(dir.path()));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
    assert!(stderr.contains("definitely-not-a-real-binary-otpfeed"));
}

#[test]
fn test_print_last_message_with_unreachable_provider() {
    let dir = config_dir(&shell_login_config("exit 0"));

    let output = run_with_all_credentials(otpfeed(dir.path()).arg("--print-last-message"));

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
}
