use otpfeed_core::config::toml_config::{load_config, TomlConfig};
use otpfeed_core::config::AcquisitionPolicy;
use otpfeed_core::error::{ConfigError, OtpFeedError};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_full_config_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
[acquisition]
grace_period_secs = 5
poll_interval_ms = 2000
overall_timeout_secs = 120
freshness_window_secs = 60
lookback_days = 0
sender_filter = "+15550100"
marker_phrase = "Apple ID Code"
fetch_limit = 20

[command]
program = "bundle"
args = ["exec", "fastlane", "spaceauth", "-u"]

[twilio]
api_base = "http://localhost:8080"
request_timeout_secs = 3
"#,
    )
    .unwrap();

    let config = load_config(Some(config_path.as_path())).unwrap();

    let policy = &config.acquisition;
    assert_eq!(policy.grace_period(), Duration::from_secs(5));
    assert_eq!(policy.poll_interval(), Duration::from_millis(2000));
    assert_eq!(policy.overall_timeout(), Duration::from_secs(120));
    assert_eq!(policy.freshness_window(), Duration::from_secs(60));
    assert_eq!(policy.lookback_days, 0);
    assert_eq!(policy.sender_filter, "+15550100");
    assert_eq!(policy.fetch_limit, 20);
    assert_eq!(
        config.command.args_for("dev@example.com"),
        vec!["exec", "fastlane", "spaceauth", "-u", "dev@example.com"]
    );
    assert_eq!(config.twilio.api_base, "http://localhost:8080");
    assert_eq!(config.twilio.request_timeout(), Duration::from_secs(3));
}

#[test]
fn test_empty_file_gives_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "").unwrap();

    let config = load_config(Some(config_path.as_path())).unwrap();

    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.acquisition, AcquisitionPolicy::default());
    assert_eq!(config.command.args_for("a"), vec!["spaceauth", "-u", "a"]);
}

#[test]
fn test_invalid_policy_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[acquisition]\npoll_interval_ms = 10\n").unwrap();

    let result = load_config(Some(config_path.as_path()));

    match result {
        Err(OtpFeedError::Config(ConfigError::ValidationError { message })) => {
            assert!(message.contains("poll_interval_ms"));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_malformed_toml_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[acquisition\ngrace_period_secs = ").unwrap();

    let result = load_config(Some(config_path.as_path()));

    assert!(matches!(result, Err(OtpFeedError::Toml(_))));
    assert_eq!(result.unwrap_err().exit_code(), 2);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("absent.toml");

    let result = load_config(Some(config_path.as_path()));

    assert!(matches!(
        result,
        Err(OtpFeedError::Config(ConfigError::LoadFailed { .. }))
    ));
}
