use std::sync::{Arc, Mutex};

use taskpoll::engine::TaskPollerBuilder;
use taskpoll::fetch::StatusQuery;
use taskpoll::types::{TaskId, TaskStatus};

/// One callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Update(TaskId, TaskStatus),
    Complete(TaskId, TaskStatus),
}

/// Records every callback invocation, in order.
#[derive(Debug, Clone, Default)]
pub struct CallbackRecorder {
    events: Arc<Mutex<Vec<Observed>>>,
}

impl CallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register both callbacks on a builder.
    pub fn attach<Q: StatusQuery>(&self, builder: TaskPollerBuilder<Q>) -> TaskPollerBuilder<Q> {
        let updates = Arc::clone(&self.events);
        let completions = Arc::clone(&self.events);
        builder
            .on_update(move |s| {
                updates
                    .lock()
                    .unwrap()
                    .push(Observed::Update(s.id.clone(), s.status));
            })
            .on_complete(move |s| {
                completions
                    .lock()
                    .unwrap()
                    .push(Observed::Complete(s.id.clone(), s.status));
            })
    }

    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(TaskId, TaskStatus)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Update(id, status) => Some((id, status)),
                Observed::Complete(..) => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<TaskId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Complete(id, _) => Some(id),
                Observed::Update(..) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}
