// src/watchset/completed.rs

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::types::{TaskId, TaskSnapshot};

/// Ids observed in a terminal state during the current session.
///
/// Ids are only ever added; the set is cleared once, when a new session
/// starts.
#[derive(Debug, Default, Clone)]
pub struct CompletedSet {
    ids: HashSet<TaskId>,
}

impl CompletedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget everything. Called exactly once per session, at start.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Merge a snapshot into the set.
    ///
    /// Returns `true` only the first time a terminal status is seen for an
    /// id. Non-terminal and malformed snapshots leave the set untouched.
    pub fn record(&mut self, snapshot: &TaskSnapshot) -> bool {
        if !snapshot.is_well_formed() {
            warn!(status = %snapshot.status, "ignoring snapshot without a task id");
            return false;
        }

        if !snapshot.is_terminal() {
            return false;
        }

        let inserted = self.ids.insert(snapshot.id.clone());
        if inserted {
            debug!(task = %snapshot.id, status = %snapshot.status, "task reached terminal state");
        }
        inserted
    }
}

/// `watch_set \ completed`, preserving watch set order.
///
/// A repeated id is only reported once (at its first position).
pub fn active_ids(watch_set: &[TaskId], completed: &CompletedSet) -> Vec<TaskId> {
    let mut seen: HashSet<&str> = HashSet::new();

    watch_set
        .iter()
        .filter(|id| !completed.contains(id))
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
