// src/engine/callbacks.rs

use std::fmt;

use crate::types::TaskSnapshot;

/// Boxed snapshot callback.
pub type SnapshotCallback = Box<dyn FnMut(&TaskSnapshot) + Send + 'static>;

/// Caller callbacks, invoked from the runtime loop one at a time.
///
/// - `on_update` fires for every snapshot observed on every tick, including
///   repeated `running` observations.
/// - `on_complete` fires exactly once per task and session, on the tick where
///   its terminal status is first seen.
#[derive(Default)]
pub struct PollCallbacks {
    on_update: Option<SnapshotCallback>,
    on_complete: Option<SnapshotCallback>,
}

impl PollCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: FnMut(&TaskSnapshot) + Send + 'static,
    {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut(&TaskSnapshot) + Send + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub(crate) fn update(&mut self, snapshot: &TaskSnapshot) {
        if let Some(cb) = self.on_update.as_mut() {
            cb(snapshot);
        }
    }

    pub(crate) fn complete(&mut self, snapshot: &TaskSnapshot) {
        if let Some(cb) = self.on_complete.as_mut() {
            cb(snapshot);
        }
    }
}

impl fmt::Debug for PollCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollCallbacks")
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
