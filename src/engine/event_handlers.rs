// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::core::SessionState;
use crate::engine::{PollerOptions, PollerState, SessionEnd, SessionId};
use crate::fetch::TickReport;
use crate::types::{TaskId, TaskSnapshot};
use crate::watchset::active_ids;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand {
    /// (Re-)arm the single tick timer, replacing any armed deadline.
    ArmTimer(Duration),
    /// Drop the armed deadline, if any.
    CancelTimer,
    /// Query these ids concurrently and report back with `TickSettled`.
    Fetch {
        session: SessionId,
        ids: Vec<TaskId>,
    },
    /// Invoke the caller's update callback.
    NotifyUpdate(TaskSnapshot),
    /// Invoke the caller's completion callback.
    NotifyComplete(TaskSnapshot),
    SessionStarted(SessionId),
    SessionEnded {
        session: SessionId,
        reason: SessionEnd,
    },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
}

impl CoreStep {
    fn none() -> Self {
        Self::default()
    }

    fn with(commands: Vec<CoreCommand>) -> Self {
        Self { commands }
    }

    /// The fetch request in this step, if any.
    pub fn fetch_ids(&self) -> Option<&[TaskId]> {
        self.commands.iter().find_map(|c| match c {
            CoreCommand::Fetch { ids, .. } => Some(ids.as_slice()),
            _ => None,
        })
    }

    /// The delay armed by this step, if any.
    pub fn armed_delay(&self) -> Option<Duration> {
        self.commands.iter().find_map(|c| match c {
            CoreCommand::ArmTimer(delay) => Some(*delay),
            _ => None,
        })
    }
}

/// Begin a fresh session.
///
/// No-op while a session is already live, or when the watch set is empty.
pub fn handle_start(s: &mut SessionState, watch_set: &[TaskId]) -> CoreStep {
    if s.state.is_active() {
        debug!(session = s.session, state = %s.state, "start requested while active; ignoring");
        return CoreStep::none();
    }

    if watch_set.is_empty() {
        debug!("start requested with an empty watch set; nothing to poll");
        return CoreStep::none();
    }

    s.session += 1;
    s.completed.clear();
    let delay = s.interval.reset();
    s.state = PollerState::Scheduled;

    info!(
        session = s.session,
        tasks = watch_set.len(),
        delay_ms = delay.as_millis() as u64,
        "polling session started"
    );

    CoreStep::with(vec![
        CoreCommand::SessionStarted(s.session),
        CoreCommand::ArmTimer(delay),
    ])
}

/// Stop the current session (if any). Idempotent.
pub fn handle_stop(s: &mut SessionState) -> CoreStep {
    if s.state == PollerState::Stopped {
        debug!(session = s.session, "stop requested while already stopped; ignoring");
        return CoreStep::none();
    }

    let was_active = s.state.is_active();
    s.state = PollerState::Stopped;

    let mut commands = vec![CoreCommand::CancelTimer];
    if was_active {
        info!(session = s.session, "polling session stopped");
        commands.push(CoreCommand::SessionEnded {
            session: s.session,
            reason: SessionEnd::Stopped,
        });
    }
    CoreStep::with(commands)
}

/// The armed timer elapsed.
pub fn handle_timer_fired(s: &mut SessionState, visible: bool, watch_set: &[TaskId]) -> CoreStep {
    if s.state != PollerState::Scheduled {
        debug!(state = %s.state, "timer fired outside of Scheduled; ignoring");
        return CoreStep::none();
    }
    begin_tick(s, visible, watch_set)
}

/// The surface became visible or hidden.
///
/// Regaining visibility while a tick is armed runs that tick right away so a
/// stale long delay does not hold the caller back.
pub fn handle_visibility_change(
    s: &mut SessionState,
    visible: bool,
    watch_set: &[TaskId],
) -> CoreStep {
    if !visible {
        debug!(session = s.session, "surface hidden; polling will back off to the max interval");
        return CoreStep::none();
    }

    if s.state != PollerState::Scheduled {
        return CoreStep::none();
    }

    debug!(session = s.session, "surface visible again; ticking immediately");
    begin_tick(s, true, watch_set)
}

/// The caller replaced the watch set.
pub fn handle_watch_set_replaced(
    s: &mut SessionState,
    options: &PollerOptions,
    watch_set: &[TaskId],
) -> CoreStep {
    if !options.auto_start {
        // The next tick picks up the new contents on its own.
        return CoreStep::none();
    }

    if watch_set.is_empty() {
        if s.state.is_active() {
            debug!(session = s.session, "watch set emptied; stopping session");
            return handle_stop(s);
        }
        return CoreStep::none();
    }

    if !s.state.is_active() {
        return handle_start(s, watch_set);
    }

    CoreStep::none()
}

/// A fetch fanout finished.
///
/// Results from an older session, or arriving after a stop, are dropped
/// without firing any callback.
pub fn handle_tick_settled(
    s: &mut SessionState,
    session: SessionId,
    report: TickReport,
    watch_set: &[TaskId],
) -> CoreStep {
    if session != s.session || s.state != PollerState::Running {
        debug!(
            settled_session = session,
            current_session = s.session,
            state = %s.state,
            "discarding results of a stale tick"
        );
        return CoreStep::none();
    }

    let mut commands = Vec::new();

    let delay = if report.all_failed() {
        // Shed load while the backend is unreachable; the adaptive
        // trajectory is held as-is.
        warn!(
            session = s.session,
            failed = report.failed.len(),
            "every status query failed this tick; backing off to the max interval"
        );
        s.interval.max()
    } else {
        let mut any_in_flight = false;

        for snapshot in report.snapshots {
            if !snapshot.is_well_formed() {
                warn!(status = %snapshot.status, "dropping snapshot without a task id");
                continue;
            }

            any_in_flight |= snapshot.status.is_in_flight();

            let newly_completed = s.completed.record(&snapshot);
            if newly_completed {
                commands.push(CoreCommand::NotifyUpdate(snapshot.clone()));
                commands.push(CoreCommand::NotifyComplete(snapshot));
            } else {
                commands.push(CoreCommand::NotifyUpdate(snapshot));
            }
        }

        s.interval.adapt(any_in_flight)
    };

    let remaining = active_ids(watch_set, &s.completed);
    if remaining.is_empty() {
        s.state = PollerState::Idle;
        info!(
            session = s.session,
            completed = s.completed.len(),
            "no active tasks left; polling session finished"
        );
        commands.push(CoreCommand::SessionEnded {
            session: s.session,
            reason: SessionEnd::Drained,
        });
        return CoreStep::with(commands);
    }

    s.state = PollerState::Scheduled;
    debug!(
        session = s.session,
        active = remaining.len(),
        delay_ms = delay.as_millis() as u64,
        "next tick armed"
    );
    commands.push(CoreCommand::ArmTimer(delay));
    CoreStep::with(commands)
}

/// Shared body of a timer- or visibility-driven tick.
fn begin_tick(s: &mut SessionState, visible: bool, watch_set: &[TaskId]) -> CoreStep {
    if !visible {
        let delay = s.interval.max();
        debug!(
            session = s.session,
            delay_ms = delay.as_millis() as u64,
            "surface hidden; skipping fetch"
        );
        return CoreStep::with(vec![CoreCommand::ArmTimer(delay)]);
    }

    let ids = active_ids(watch_set, &s.completed);
    if ids.is_empty() {
        s.state = PollerState::Idle;
        info!(session = s.session, "no active tasks; polling session finished");
        return CoreStep::with(vec![
            CoreCommand::CancelTimer,
            CoreCommand::SessionEnded {
                session: s.session,
                reason: SessionEnd::Drained,
            },
        ]);
    }

    s.state = PollerState::Running;
    debug!(session = s.session, ids = ?ids, "tick: querying active tasks");
    CoreStep::with(vec![
        CoreCommand::CancelTimer,
        CoreCommand::Fetch {
            session: s.session,
            ids,
        },
    ])
}
