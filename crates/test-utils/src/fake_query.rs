use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use taskpoll::fetch::{QueryError, QueryFuture, StatusQuery};
use taskpoll::types::{TaskId, TaskSnapshot};

#[derive(Debug, Clone)]
enum Scripted {
    Snapshot(TaskSnapshot),
    Error(String),
}

#[derive(Debug)]
struct Inner {
    /// Per-id responses, consumed one per query; the last one repeats.
    scripts: Mutex<HashMap<TaskId, VecDeque<Scripted>>>,
    calls: Mutex<Vec<TaskId>>,
    call_count: watch::Sender<usize>,
    /// Queries wait while this is `false`.
    gate: watch::Sender<bool>,
}

/// A fake status backend that:
/// - answers from per-task scripts (one entry per query, last one sticky)
/// - records every queried id
/// - can hold queries in flight until released
#[derive(Debug, Clone)]
pub struct ScriptedStatusQuery {
    inner: Arc<Inner>,
}

impl ScriptedStatusQuery {
    pub fn new() -> Self {
        let (call_count, _) = watch::channel(0);
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                scripts: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                call_count,
                gate,
            }),
        }
    }

    /// Append a snapshot to `id`'s script.
    pub fn push(&self, id: &str, snapshot: TaskSnapshot) -> &Self {
        self.push_scripted(id, Scripted::Snapshot(snapshot))
    }

    /// Append a failure to `id`'s script.
    pub fn push_err(&self, id: &str, message: &str) -> &Self {
        self.push_scripted(id, Scripted::Error(message.to_string()))
    }

    /// Hold every subsequent query until [`release`](Self::release).
    pub fn hold(&self) {
        self.inner.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.inner.gate.send_replace(true);
    }

    /// Every id queried so far, in order.
    pub fn calls(&self) -> Vec<TaskId> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == id).count()
    }

    pub fn call_count(&self) -> usize {
        *self.inner.call_count.borrow()
    }

    /// Wait until at least `n` queries have been issued.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.inner.call_count.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    fn push_scripted(&self, id: &str, entry: Scripted) -> &Self {
        self.inner
            .scripts
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(entry);
        self
    }

    fn next_response(&self, id: &str) -> Result<TaskSnapshot, QueryError> {
        let mut scripts = self.inner.scripts.lock().unwrap();
        let script = scripts
            .get_mut(id)
            .ok_or_else(|| QueryError::Unavailable(format!("no script for {id}")))?;

        let entry = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match entry {
            Some(Scripted::Snapshot(s)) => Ok(s),
            Some(Scripted::Error(msg)) => Err(QueryError::Unavailable(msg)),
            None => Err(QueryError::Unavailable(format!("empty script for {id}"))),
        }
    }
}

impl Default for ScriptedStatusQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusQuery for ScriptedStatusQuery {
    fn query<'a>(&'a self, id: &'a str) -> QueryFuture<'a> {
        Box::pin(async move {
            self.inner.calls.lock().unwrap().push(id.to_string());
            self.inner.call_count.send_modify(|c| *c += 1);

            let mut gate = self.inner.gate.subscribe();
            let _ = gate.wait_for(|open| *open).await;

            self.next_response(id)
        })
    }
}
