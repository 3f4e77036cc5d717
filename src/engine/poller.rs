// src/engine/poller.rs

//! Public handle to a running poller.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::runtime::{Control, Runtime};
use crate::engine::{CoreRuntime, PollCallbacks, PollerOptions, PollerState};
use crate::errors::{PollerError, Result};
use crate::fetch::StatusQuery;
use crate::types::{TaskId, TaskSnapshot};
use crate::visibility::{always_visible, VisibilityReader};
use crate::watchset::WatchSetHandle;

/// Builder for [`TaskPoller`].
///
/// ```no_run
/// # use taskpoll::engine::TaskPoller;
/// # use taskpoll::fetch::HttpStatusQuery;
/// # async fn demo() -> taskpoll::errors::Result<()> {
/// let query = HttpStatusQuery::new("http://localhost:3000", None, std::time::Duration::from_secs(10))?;
/// let poller = TaskPoller::builder(query)
///     .task_ids(["task_1", "task_2"])
///     .on_update(|s| println!("{} {}", s.id, s.status))
///     .on_complete(|s| println!("{} done", s.id))
///     .spawn()?;
/// poller.wait_until_inactive().await;
/// # Ok(())
/// # }
/// ```
pub struct TaskPollerBuilder<Q: StatusQuery> {
    query: Q,
    options: PollerOptions,
    watch_set: WatchSetHandle,
    visibility: Option<VisibilityReader>,
    callbacks: PollCallbacks,
}

impl<Q: StatusQuery> TaskPollerBuilder<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            options: PollerOptions::default(),
            watch_set: WatchSetHandle::default(),
            visibility: None,
            callbacks: PollCallbacks::new(),
        }
    }

    pub fn options(mut self, options: PollerOptions) -> Self {
        self.options = options;
        self
    }

    /// Share a caller-owned watch set.
    pub fn watch_set(mut self, handle: WatchSetHandle) -> Self {
        self.watch_set = handle;
        self
    }

    /// Seed the watch set with these ids.
    pub fn task_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.watch_set.replace(ids);
        self
    }

    /// Visibility signal; without one the surface is always visible.
    pub fn visibility(mut self, reader: VisibilityReader) -> Self {
        self.visibility = Some(reader);
        self
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: FnMut(&TaskSnapshot) + Send + 'static,
    {
        self.callbacks = self.callbacks.on_update(f);
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut(&TaskSnapshot) + Send + 'static,
    {
        self.callbacks = self.callbacks.on_complete(f);
        self
    }

    /// Validate the options and spawn the runtime loop.
    ///
    /// Must be called from within a Tokio runtime. With `auto_start`, a
    /// non-empty watch set starts a session right away.
    pub fn spawn(self) -> Result<TaskPoller> {
        self.options.validate()?;

        let (control_tx, control_rx) = mpsc::channel::<Control>(16);
        let (state_tx, state_rx) = watch::channel(PollerState::Idle);

        let mut runtime = Runtime::new(
            CoreRuntime::new(self.options),
            Arc::new(self.query),
            self.callbacks,
            control_rx,
            self.watch_set.subscribe(),
            self.visibility.unwrap_or_else(always_visible),
            state_tx,
        );

        runtime.bootstrap();
        let join = tokio::spawn(runtime.run());

        Ok(TaskPoller {
            control_tx,
            watch_set: self.watch_set,
            state_rx,
            options: self.options,
            join,
        })
    }
}

/// Handle to a spawned poller.
///
/// Dropping the handle tears the poller down: the timer is dropped and no
/// further callbacks fire.
#[derive(Debug)]
pub struct TaskPoller {
    control_tx: mpsc::Sender<Control>,
    watch_set: WatchSetHandle,
    state_rx: watch::Receiver<PollerState>,
    options: PollerOptions,
    join: JoinHandle<()>,
}

impl TaskPoller {
    pub fn builder<Q: StatusQuery>(query: Q) -> TaskPollerBuilder<Q> {
        TaskPollerBuilder::new(query)
    }

    /// Start a session. A no-op while one is active or when the watch set is
    /// empty. Returns the state reached.
    pub async fn start(&self) -> Result<PollerState> {
        self.request(Control::Start).await
    }

    /// Stop the current session. Idempotent.
    ///
    /// Once this returns, no callback of the stopped session will fire, even
    /// if queries issued before the stop resolve later.
    pub async fn stop(&self) -> Result<PollerState> {
        self.request(Control::Stop).await
    }

    pub fn state(&self) -> PollerState {
        *self.state_rx.borrow()
    }

    /// True while a session is live.
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn options(&self) -> &PollerOptions {
        &self.options
    }

    pub fn watch_set(&self) -> &WatchSetHandle {
        &self.watch_set
    }

    /// Replace the watch set wholesale.
    pub fn set_task_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.watch_set.replace(ids);
    }

    /// Subscribe to state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<PollerState> {
        self.state_rx.clone()
    }

    /// Wait until no session is live (drained, stopped, or never started).
    pub async fn wait_until_inactive(&self) -> PollerState {
        let mut rx = self.state_rx.clone();
        match rx.wait_for(|state| !state.is_active()).await {
            Ok(state) => *state,
            // Runtime gone: nothing can be active any more.
            Err(_) => PollerState::Stopped,
        }
    }

    /// Stop, then wait for the runtime loop to exit.
    pub async fn shutdown(self) -> Result<()> {
        let TaskPoller {
            control_tx, join, ..
        } = self;

        let (ack_tx, ack_rx) = oneshot::channel();
        if control_tx.send(Control::Stop(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
        drop(control_tx);

        join.await
            .map_err(|e| PollerError::Other(anyhow::anyhow!("poller runtime panicked: {e}")))?;
        debug!("poller runtime joined");
        Ok(())
    }

    async fn request(
        &self,
        make: fn(oneshot::Sender<PollerState>) -> Control,
    ) -> Result<PollerState> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.control_tx
            .send(make(ack_tx))
            .await
            .map_err(|_| PollerError::RuntimeClosed)?;
        ack_rx.await.map_err(|_| PollerError::RuntimeClosed)
    }
}
