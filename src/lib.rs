// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod logging;
pub mod types;
pub mod visibility;
pub mod watchset;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, validate_config, ConfigFile};
use crate::engine::TaskPoller;
use crate::fetch::HttpStatusQuery;
use crate::types::{TaskSnapshot, TaskStatus};
use crate::visibility::{spawn_pause_file_watcher, VisibilitySignal};

pub use crate::engine::{PollerOptions, PollerState, TaskPollerBuilder};
pub use crate::types::TaskId;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - the HTTP status query
/// - (optional) the pause-file visibility source
/// - the poller and its stdout reporting
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    apply_overrides(&mut cfg, &args);
    validate_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &args);
        return Ok(());
    }

    let token = cfg
        .api
        .token
        .clone()
        .or_else(|| std::env::var("TASKPOLL_TOKEN").ok());
    let query = HttpStatusQuery::new(&cfg.api.base_url, token, cfg.api.request_timeout())?;

    // The CLI starts its one session explicitly.
    let mut options = cfg.polling.to_options();
    options.auto_start = false;

    let visibility = VisibilitySignal::new(true);
    let _pause_handle = match &args.pause_file {
        Some(path) => Some(spawn_pause_file_watcher(path.clone(), visibility.clone())?),
        None => None,
    };

    let json = args.json;
    let failures = Arc::new(AtomicUsize::new(0));
    let failures_cb = Arc::clone(&failures);

    let poller = TaskPoller::builder(query)
        .options(options)
        .task_ids(args.task_ids.iter().cloned())
        .visibility(visibility.subscribe())
        .on_update(move |snapshot| {
            if !snapshot.is_terminal() {
                print_snapshot(snapshot, json);
            }
        })
        .on_complete(move |snapshot| {
            if snapshot.status == TaskStatus::Failed {
                failures_cb.fetch_add(1, Ordering::SeqCst);
            }
            print_snapshot(snapshot, json);
        })
        .spawn()?;

    let state = poller.start().await?;
    info!(tasks = args.task_ids.len(), %state, "watching tasks");

    tokio::select! {
        state = poller.wait_until_inactive() => {
            info!(%state, "polling finished");
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                eprintln!("failed to listen for Ctrl+C: {e}");
            }
            info!("interrupted; stopping poller");
        }
    }

    poller.shutdown().await?;

    session_outcome(failures.load(Ordering::SeqCst))
}

/// Exit decision once polling is over: an error when any watched task ended
/// `failed`, so the process exits non-zero.
pub fn session_outcome(failed: usize) -> Result<()> {
    if failed > 0 {
        bail!("{failed} task(s) failed");
    }
    Ok(())
}

/// CLI flags win over the config file.
fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let Some(url) = &args.base_url {
        cfg.api.base_url = url.clone();
    }
    if let Some(token) = &args.token {
        cfg.api.token = Some(token.clone());
    }
    if let Some(ms) = args.min_interval_ms {
        cfg.polling.min_interval_ms = ms;
    }
    if let Some(ms) = args.max_interval_ms {
        cfg.polling.max_interval_ms = ms;
    }
    if let Some(ms) = args.step_ms {
        cfg.polling.step_ms = ms;
    }
}

/// One line per snapshot: tab-separated for humans, or raw JSON.
fn print_snapshot(snapshot: &TaskSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("failed to encode snapshot for {}: {e}", snapshot.id),
        }
        return;
    }

    match snapshot.status {
        TaskStatus::Succeeded => {
            println!("{}\t{}\t{}", snapshot.id, snapshot.status, snapshot.image_urls().join(" "));
        }
        TaskStatus::Failed => {
            println!(
                "{}\t{}\t{}",
                snapshot.id,
                snapshot.status,
                snapshot.error_message().unwrap_or("")
            );
        }
        TaskStatus::Pending | TaskStatus::Running => match snapshot.progress() {
            Some(progress) => println!("{}\t{}\t{progress:.0}%", snapshot.id, snapshot.status),
            None => println!("{}\t{}", snapshot.id, snapshot.status),
        },
    }
}

/// Simple dry-run output: print the effective settings and task ids.
fn print_dry_run(cfg: &ConfigFile, args: &CliArgs) {
    println!("taskpoll dry-run");
    println!("  api.base_url = {}", cfg.api.base_url);
    println!("  api.token = {}", if cfg.api.token.is_some() { "<set>" } else { "<unset>" });
    println!("  api.request_timeout_ms = {}", cfg.api.request_timeout_ms);
    println!("  polling.min_interval_ms = {}", cfg.polling.min_interval_ms);
    println!("  polling.max_interval_ms = {}", cfg.polling.max_interval_ms);
    println!("  polling.step_ms = {}", cfg.polling.step_ms);
    if let Some(path) = &args.pause_file {
        println!("  pause_file = {}", path.display());
    }
    println!();

    println!("tasks ({}):", args.task_ids.len());
    for id in &args.task_ids {
        println!("  - {id}");
    }

    debug!("dry-run complete (no polling)");
}
