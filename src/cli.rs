// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskpoll`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskpoll",
    version,
    about = "Watch image-generation tasks until they finish, polling adaptively.",
    long_about = None
)]
pub struct CliArgs {
    /// Task ids to watch.
    #[arg(value_name = "TASK_ID", required = true)]
    pub task_ids: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Taskpoll.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the task API (overrides `[api].base_url`).
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Bearer token (overrides `[api].token` and `TASKPOLL_TOKEN`).
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Minimum polling interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub min_interval_ms: Option<u64>,

    /// Maximum polling interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub max_interval_ms: Option<u64>,

    /// Interval growth per tick while tasks are still running, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub step_ms: Option<u64>,

    /// Poll coarsely while this file exists, and catch up as soon as it is
    /// removed.
    #[arg(long, value_name = "PATH")]
    pub pause_file: Option<PathBuf>,

    /// Print every snapshot as one JSON object per line.
    #[arg(long)]
    pub json: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKPOLL_LOG` (level or filter directives) or `info` is
    /// used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the effective settings without polling.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive enabling this level for every target.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
