// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::time::Duration;

use clap::Parser;
use tempfile::tempdir;

use taskpoll::cli::{CliArgs, LogLevel};
use taskpoll::config::{load_and_validate, load_from_path, load_or_default, validate_config, ConfigFile};
use taskpoll::errors::PollerError;
use taskpoll::logging::build_filter;
use taskpoll::session_outcome;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn defaults_are_valid() -> TestResult {
    let cfg = ConfigFile::default();
    validate_config(&cfg)?;

    let options = cfg.polling.to_options();
    assert_eq!(options.min_interval, Duration::from_millis(2_000));
    assert_eq!(options.max_interval, Duration::from_millis(10_000));
    assert_eq!(options.step, Duration::from_millis(1_000));
    assert!(options.auto_start);
    assert_eq!(cfg.api.base_url, "http://localhost:3000");
    assert_eq!(cfg.api.request_timeout(), Duration::from_secs(15));
    Ok(())
}

#[test]
fn partial_file_keeps_defaults_for_missing_keys() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Taskpoll.toml");
    fs::write(
        &path,
        r#"
[polling]
max_interval_ms = 30000

[api]
base_url = "https://api.example.com/v1"
token = "secret"
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.polling.min_interval_ms, 2_000);
    assert_eq!(cfg.polling.max_interval_ms, 30_000);
    assert_eq!(cfg.api.base_url, "https://api.example.com/v1");
    assert_eq!(cfg.api.token.as_deref(), Some("secret"));
    assert_eq!(cfg.api.request_timeout_ms, 15_000);
    Ok(())
}

#[test]
fn empty_file_is_all_defaults() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("empty.toml");
    fs::write(&path, "")?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.polling.step_ms, 1_000);
    Ok(())
}

#[test]
fn min_above_max_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[polling]\nmin_interval_ms = 5000\nmax_interval_ms = 1000\n",
    )?;

    // Parsing alone succeeds; validation does not.
    load_from_path(&path)?;
    let err = load_and_validate(&path).unwrap_err();
    match err {
        PollerError::ConfigError(msg) => {
            assert!(msg.starts_with("[polling]"), "unexpected message: {msg}");
            assert!(msg.contains("5000"), "unexpected message: {msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn zero_step_and_zero_min_are_rejected() {
    let mut cfg = ConfigFile::default();
    cfg.polling.step_ms = 0;
    assert!(matches!(validate_config(&cfg), Err(PollerError::ConfigError(_))));

    let mut cfg = ConfigFile::default();
    cfg.polling.min_interval_ms = 0;
    assert!(matches!(validate_config(&cfg), Err(PollerError::ConfigError(_))));
}

#[test]
fn equal_bounds_are_allowed() -> TestResult {
    let mut cfg = ConfigFile::default();
    cfg.polling.min_interval_ms = 4_000;
    cfg.polling.max_interval_ms = 4_000;
    validate_config(&cfg)?;
    Ok(())
}

#[test]
fn api_settings_are_validated() {
    let mut cfg = ConfigFile::default();
    cfg.api.base_url = "   ".to_string();
    assert!(matches!(validate_config(&cfg), Err(PollerError::ConfigError(_))));

    let mut cfg = ConfigFile::default();
    cfg.api.base_url = "not a url".to_string();
    assert!(matches!(validate_config(&cfg), Err(PollerError::ConfigError(_))));

    let mut cfg = ConfigFile::default();
    cfg.api.base_url = "ftp://example.com".to_string();
    assert!(matches!(validate_config(&cfg), Err(PollerError::ConfigError(_))));

    let mut cfg = ConfigFile::default();
    cfg.api.request_timeout_ms = 0;
    assert!(matches!(validate_config(&cfg), Err(PollerError::ConfigError(_))));
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[polling\nmin_interval_ms = ")?;

    assert!(matches!(load_from_path(&path), Err(PollerError::TomlError(_))));
    Ok(())
}

#[test]
fn missing_explicit_file_is_a_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("nope.toml");

    assert!(matches!(
        load_or_default(Some(path.as_path())),
        Err(PollerError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn cli_parses_ids_and_overrides() -> TestResult {
    let args = CliArgs::try_parse_from([
        "taskpoll",
        "--min-interval-ms",
        "500",
        "--json",
        "--log-level",
        "debug",
        "task_1",
        "task_2",
    ])?;

    assert_eq!(args.task_ids, vec!["task_1", "task_2"]);
    assert_eq!(args.min_interval_ms, Some(500));
    assert!(args.json);
    assert!(!args.dry_run);
    assert!(args.pause_file.is_none());
    Ok(())
}

#[test]
fn cli_requires_at_least_one_task_id() {
    assert!(CliArgs::try_parse_from(["taskpoll", "--json"]).is_err());
}

#[test]
fn log_filter_prefers_cli_then_env_then_info() -> TestResult {
    let cli = build_filter(Some(LogLevel::Debug), Some("trace"))?;
    assert_eq!(cli.to_string(), "debug");

    let env = build_filter(None, Some(" taskpoll=trace "))?;
    assert_eq!(env.to_string(), "taskpoll=trace");

    let fallback = build_filter(None, Some(""))?;
    assert_eq!(fallback.to_string(), "info");

    assert!(build_filter(None, Some("taskpoll=loud")).is_err());
    Ok(())
}

#[test]
fn failed_tasks_make_the_run_fail() {
    assert!(session_outcome(0).is_ok());

    let err = session_outcome(2).unwrap_err();
    assert_eq!(err.to_string(), "2 task(s) failed");
}
