// src/watchset/shared.rs

use tokio::sync::watch;

use crate::types::TaskId;

/// Caller-side handle to the watch set.
///
/// Replacing the contents notifies the engine, which re-reads the list on
/// its next tick and, when the lifecycle is auto-managed, starts or stops
/// the session accordingly.
#[derive(Debug, Clone)]
pub struct WatchSetHandle {
    tx: watch::Sender<Vec<TaskId>>,
}

/// Engine-side view of the watch set.
pub type WatchSetReader = watch::Receiver<Vec<TaskId>>;

impl WatchSetHandle {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        let (tx, _rx) = watch::channel(ids.into_iter().map(Into::into).collect());
        Self { tx }
    }

    /// Replace the whole watch set.
    pub fn replace<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.tx.send_replace(ids.into_iter().map(Into::into).collect());
    }

    /// Append one id, unless it is already watched.
    pub fn push(&self, id: impl Into<TaskId>) {
        let id = id.into();
        self.tx.send_if_modified(|ids| {
            if ids.contains(&id) {
                false
            } else {
                ids.push(id);
                true
            }
        });
    }

    /// Remove one id. Returns `true` if it was present.
    pub fn remove(&self, id: &str) -> bool {
        self.tx.send_if_modified(|ids| {
            let before = ids.len();
            ids.retain(|existing| existing != id);
            ids.len() != before
        })
    }

    /// Current contents (cloned).
    pub fn snapshot(&self) -> Vec<TaskId> {
        self.tx.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn subscribe(&self) -> WatchSetReader {
        self.tx.subscribe()
    }
}

impl Default for WatchSetHandle {
    fn default() -> Self {
        Self::new(Vec::<TaskId>::new())
    }
}
