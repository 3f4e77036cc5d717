// src/engine/core.rs

//! Pure core state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`CoreEvent`]s and produces:
//! - an updated scheduler state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - owning the timer
//! - reading the watch set and visibility signal
//! - running the fetch fanout
//! - invoking caller callbacks
//!
//! The core is intended to be extensively tested without any Tokio,
//! channels or network.

use crate::engine::event_handlers::{
    handle_start, handle_stop, handle_tick_settled, handle_timer_fired,
    handle_visibility_change, handle_watch_set_replaced, CoreStep,
};
use crate::engine::interval::AdaptiveInterval;
use crate::engine::{CoreEvent, PollerOptions, PollerState, SessionId};
use crate::watchset::CompletedSet;

/// Mutable per-session bookkeeping shared by the event handlers.
#[derive(Debug)]
pub struct SessionState {
    pub state: PollerState,
    pub session: SessionId,
    pub completed: CompletedSet,
    pub interval: AdaptiveInterval,
}

impl SessionState {
    fn new(options: &PollerOptions) -> Self {
        Self {
            state: PollerState::Idle,
            session: 0,
            completed: CompletedSet::new(),
            interval: AdaptiveInterval::new(options),
        }
    }
}

/// Pure core runtime.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    options: PollerOptions,
    session: SessionState,
}

impl CoreRuntime {
    pub fn new(options: PollerOptions) -> Self {
        let session = SessionState::new(&options);
        Self { options, session }
    }

    pub fn options(&self) -> &PollerOptions {
        &self.options
    }

    pub fn state(&self) -> PollerState {
        self.session.state
    }

    pub fn is_active(&self) -> bool {
        self.session.state.is_active()
    }

    pub fn session_id(&self) -> SessionId {
        self.session.session
    }

    pub fn completed(&self) -> &CompletedSet {
        &self.session.completed
    }

    /// The adaptive interval as it currently stands (for tests and logging).
    pub fn current_interval(&self) -> std::time::Duration {
        self.session.interval.current()
    }

    /// Handle a single event, updating state and returning the commands for
    /// the IO shell.
    pub fn step(&mut self, event: CoreEvent) -> CoreStep {
        match event {
            CoreEvent::StartRequested { watch_set } => handle_start(&mut self.session, &watch_set),
            CoreEvent::StopRequested => handle_stop(&mut self.session),
            CoreEvent::TimerFired { visible, watch_set } => {
                handle_timer_fired(&mut self.session, visible, &watch_set)
            }
            CoreEvent::VisibilityChanged { visible, watch_set } => {
                handle_visibility_change(&mut self.session, visible, &watch_set)
            }
            CoreEvent::WatchSetReplaced { watch_set } => {
                handle_watch_set_replaced(&mut self.session, &self.options, &watch_set)
            }
            CoreEvent::TickSettled {
                session,
                report,
                watch_set,
            } => handle_tick_settled(&mut self.session, session, report, &watch_set),
        }
    }
}
