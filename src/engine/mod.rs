// src/engine/mod.rs

//! Polling engine.
//!
//! This module ties together:
//! - the adaptive interval policy ([`interval`])
//! - the pure tick/lifecycle state machine ([`core`], [`event_handlers`])
//! - the async runtime loop that owns the timer, reads visibility and the
//!   watch set, dispatches fetch fanouts and invokes callbacks ([`runtime`])
//! - the public [`TaskPoller`] handle ([`poller`])
//!
//! The core never touches Tokio, channels or the network; the runtime is a
//! thin IO shell that feeds it [`CoreEvent`]s and executes the
//! [`CoreCommand`]s it returns.

use std::fmt;
use std::time::Duration;

use crate::errors::{PollerError, Result};
use crate::fetch::TickReport;
use crate::types::TaskId;

/// Monotonically increasing session number; bumped on every `start`.
pub type SessionId = u64;

/// Scheduler state as observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    /// No session; either never started or the last one drained naturally.
    #[default]
    Idle,
    /// A timer is armed for the next tick.
    Scheduled,
    /// A fetch fanout is in flight.
    Running,
    /// Explicitly stopped.
    Stopped,
}

impl PollerState {
    /// True while a session is live (a tick is armed or running).
    pub fn is_active(self) -> bool {
        matches!(self, PollerState::Scheduled | PollerState::Running)
    }
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollerState::Idle => "idle",
            PollerState::Scheduled => "scheduled",
            PollerState::Running => "running",
            PollerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(2_000);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_INTERVAL_STEP: Duration = Duration::from_millis(1_000);

/// Tuning for one poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerOptions {
    pub min_interval: Duration,
    pub max_interval: Duration,
    /// Added to the current interval after every tick that still sees
    /// pending/running tasks.
    pub step: Duration,
    /// Start/stop automatically as the watch set becomes non-empty/empty.
    pub auto_start: bool,
}

impl PollerOptions {
    /// Build validated options.
    pub fn new(
        min_interval: Duration,
        max_interval: Duration,
        step: Duration,
        auto_start: bool,
    ) -> Result<Self> {
        let options = Self {
            min_interval,
            max_interval,
            step,
            auto_start,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_interval.is_zero() {
            return Err(PollerError::ConfigError(
                "min interval must be greater than zero".to_string(),
            ));
        }
        if self.min_interval > self.max_interval {
            return Err(PollerError::ConfigError(format!(
                "min interval ({} ms) must not exceed max interval ({} ms)",
                self.min_interval.as_millis(),
                self.max_interval.as_millis()
            )));
        }
        if self.step.is_zero() {
            return Err(PollerError::ConfigError(
                "interval step must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            step: DEFAULT_INTERVAL_STEP,
            auto_start: true,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Every watched task reached a terminal state (or the watch set emptied).
    Drained,
    /// `stop()` was requested.
    Stopped,
}

/// Inputs to the core state machine.
///
/// Every event that needs the watch set carries a fresh read of it; the core
/// never caches the caller's list.
#[derive(Debug, Clone)]
pub enum CoreEvent {
    StartRequested {
        watch_set: Vec<TaskId>,
    },
    StopRequested,
    TimerFired {
        visible: bool,
        watch_set: Vec<TaskId>,
    },
    VisibilityChanged {
        visible: bool,
        watch_set: Vec<TaskId>,
    },
    WatchSetReplaced {
        watch_set: Vec<TaskId>,
    },
    TickSettled {
        session: SessionId,
        report: TickReport,
        watch_set: Vec<TaskId>,
    },
}

pub mod callbacks;
pub mod core;
pub mod event_handlers;
pub mod interval;
pub mod poller;
pub(crate) mod runtime;

pub use callbacks::PollCallbacks;
pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use interval::AdaptiveInterval;
pub use poller::{TaskPoller, TaskPollerBuilder};
