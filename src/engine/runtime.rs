// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::engine::{
    CoreCommand, CoreEvent, CoreRuntime, CoreStep, PollCallbacks, PollerState, SessionId,
};
use crate::fetch::{fetch_all, StatusQuery, TickReport};
use crate::types::TaskId;
use crate::visibility::VisibilityReader;
use crate::watchset::WatchSetReader;

/// Requests from the public handle. Each carries an ack that is answered
/// with the state reached once the request has been fully applied.
#[derive(Debug)]
pub(crate) enum Control {
    Start(oneshot::Sender<PollerState>),
    Stop(oneshot::Sender<PollerState>),
}

/// Results of a fanout, tagged with the session that issued it.
#[derive(Debug)]
pub(crate) struct Settled {
    session: SessionId,
    report: TickReport,
}

#[derive(Debug)]
enum Input {
    Control(Control),
    Settled(Settled),
    TimerFired,
    VisibilityChanged(bool),
    VisibilityClosed,
    WatchSetReplaced(Vec<TaskId>),
    WatchSetClosed,
    /// Every handle was dropped.
    Shutdown,
}

/// Drives the core in response to timer, visibility, watch set and control
/// inputs, and delegates status reads to a `StatusQuery`.
///
/// This is a pure IO shell around [`CoreRuntime`], which contains all the
/// polling semantics. Only one input is handled at a time, so callbacks never
/// run concurrently and never run after a stop has been acknowledged.
pub(crate) struct Runtime<Q: StatusQuery> {
    core: CoreRuntime,
    query: Arc<Q>,
    callbacks: PollCallbacks,
    control_rx: mpsc::Receiver<Control>,
    settled_tx: mpsc::UnboundedSender<Settled>,
    settled_rx: mpsc::UnboundedReceiver<Settled>,
    watch_set: WatchSetReader,
    watch_set_open: bool,
    visibility: VisibilityReader,
    visibility_open: bool,
    /// Last visibility value handed to the core; only transitions matter.
    last_visible: bool,
    state_tx: watch::Sender<PollerState>,
    /// The single tick timer; `None` when nothing is armed.
    deadline: Option<Instant>,
}

impl<Q: StatusQuery> fmt::Debug for Runtime<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl<Q: StatusQuery> Runtime<Q> {
    pub(crate) fn new(
        core: CoreRuntime,
        query: Arc<Q>,
        callbacks: PollCallbacks,
        control_rx: mpsc::Receiver<Control>,
        watch_set: WatchSetReader,
        visibility: VisibilityReader,
        state_tx: watch::Sender<PollerState>,
    ) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let last_visible = *visibility.borrow();
        Self {
            core,
            query,
            callbacks,
            control_rx,
            settled_tx,
            settled_rx,
            watch_set,
            watch_set_open: true,
            visibility,
            visibility_open: true,
            last_visible,
            state_tx,
            deadline: None,
        }
    }

    /// Apply the initial watch set before the loop is spawned, so the
    /// published state is already accurate when the handle is returned.
    pub(crate) fn bootstrap(&mut self) {
        // Mark the current contents as seen so only later replacements are
        // reported as changes.
        let initial = self.watch_set.borrow_and_update().clone();
        if self.core.options().auto_start && !initial.is_empty() {
            self.step(CoreEvent::StartRequested { watch_set: initial });
        }
    }

    /// Main event loop. Returns once every handle has been dropped.
    pub(crate) async fn run(mut self) {
        let options = *self.core.options();
        info!(
            min_interval_ms = options.min_interval.as_millis() as u64,
            max_interval_ms = options.max_interval.as_millis() as u64,
            auto_start = options.auto_start,
            "task poller runtime started"
        );

        loop {
            let input = self.next_input().await;
            debug!(?input, "runtime received input");

            match input {
                Input::Control(Control::Start(ack)) => {
                    let watch_set = self.read_watch_set();
                    self.step(CoreEvent::StartRequested { watch_set });
                    let _ = ack.send(self.core.state());
                }
                Input::Control(Control::Stop(ack)) => {
                    self.step(CoreEvent::StopRequested);
                    let _ = ack.send(self.core.state());
                }
                Input::Settled(Settled { session, report }) => {
                    let watch_set = self.read_watch_set();
                    self.step(CoreEvent::TickSettled {
                        session,
                        report,
                        watch_set,
                    });
                }
                Input::TimerFired => {
                    self.deadline = None;
                    let visible = self.is_visible();
                    let watch_set = self.read_watch_set();
                    self.step(CoreEvent::TimerFired { visible, watch_set });
                }
                Input::VisibilityChanged(visible) => {
                    if visible == self.last_visible {
                        continue;
                    }
                    self.last_visible = visible;
                    let watch_set = self.read_watch_set();
                    self.step(CoreEvent::VisibilityChanged { visible, watch_set });
                }
                Input::WatchSetReplaced(watch_set) => {
                    self.step(CoreEvent::WatchSetReplaced { watch_set });
                }
                Input::VisibilityClosed => {
                    debug!("visibility signal closed; keeping last known value");
                    self.visibility_open = false;
                }
                Input::WatchSetClosed => {
                    debug!("watch set handle closed; keeping last known contents");
                    self.watch_set_open = false;
                }
                Input::Shutdown => {
                    info!("all poller handles dropped; shutting down");
                    break;
                }
            }
        }

        if self.core.is_active() {
            let step = self.core.step(CoreEvent::StopRequested);
            self.apply(step);
        }
        self.deadline = None;

        info!("task poller runtime exiting");
    }

    async fn next_input(&mut self) -> Input {
        let deadline = self.deadline;

        tokio::select! {
            biased;

            msg = self.control_rx.recv() => match msg {
                Some(control) => Input::Control(control),
                None => Input::Shutdown,
            },
            Some(settled) = self.settled_rx.recv() => Input::Settled(settled),
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                Input::TimerFired
            }
            res = self.visibility.changed(), if self.visibility_open => match res {
                Ok(()) => Input::VisibilityChanged(*self.visibility.borrow_and_update()),
                Err(_) => Input::VisibilityClosed,
            },
            res = self.watch_set.changed(), if self.watch_set_open => match res {
                Ok(()) => Input::WatchSetReplaced(self.watch_set.borrow_and_update().clone()),
                Err(_) => Input::WatchSetClosed,
            },
        }
    }

    fn step(&mut self, event: CoreEvent) {
        let step = self.core.step(event);
        self.apply(step);
    }

    /// Execute the commands of one step, then publish the resulting state.
    fn apply(&mut self, step: CoreStep) {
        for command in step.commands {
            self.execute_command(command);
        }

        let state = self.core.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::ArmTimer(delay) => {
                self.deadline = Some(Instant::now() + delay);
            }
            CoreCommand::CancelTimer => {
                self.deadline = None;
            }
            CoreCommand::Fetch { session, ids } => {
                self.spawn_fanout(session, ids);
            }
            CoreCommand::NotifyUpdate(snapshot) => {
                self.callbacks.update(&snapshot);
            }
            CoreCommand::NotifyComplete(snapshot) => {
                info!(task = %snapshot.id, status = %snapshot.status, "task reached terminal state");
                self.callbacks.complete(&snapshot);
            }
            CoreCommand::SessionStarted(session) => {
                debug!(session, "session started");
            }
            CoreCommand::SessionEnded { session, reason } => {
                debug!(session, ?reason, "session ended");
            }
        }
    }

    /// Run one fanout off the loop; its report comes back as `Settled`.
    fn spawn_fanout(&self, session: SessionId, ids: Vec<TaskId>) {
        let query = Arc::clone(&self.query);
        let tx = self.settled_tx.clone();

        tokio::spawn(async move {
            let report = fetch_all(query.as_ref(), &ids).await;
            if tx.send(Settled { session, report }).is_err() {
                debug!(session, "runtime gone; dropping tick results");
            }
        });
    }

    fn read_watch_set(&self) -> Vec<TaskId> {
        self.watch_set.borrow().clone()
    }

    fn is_visible(&self) -> bool {
        *self.visibility.borrow()
    }
}
