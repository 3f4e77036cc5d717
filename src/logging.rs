// src/logging.rs

//! Logging setup for `taskpoll` using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` CLI flag (applies to every target)
//! 2. `TASKPOLL_LOG`, either a bare level (`debug`) or full directives
//!    (`taskpoll=debug,reqwest=warn`)
//! 3. `info`
//!
//! Logs go to STDERR; stdout carries only task output.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "TASKPOLL_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env_value.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))?;

    Ok(())
}

/// Resolve the filter from the CLI level and the raw `TASKPOLL_LOG` value.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(level.as_directive()));
    }

    match env_value.map(str::trim) {
        Some(raw) if !raw.is_empty() => EnvFilter::try_new(raw)
            .map_err(|e| anyhow!("invalid {LOG_ENV} value {raw:?}: {e}")),
        _ => Ok(EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}
