// src/fetch/fanout.rs

use futures::future::join_all;
use tracing::{debug, warn};

use crate::fetch::StatusQuery;
use crate::types::{TaskId, TaskSnapshot};

/// Everything one tick learned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Ids queried this tick, in watch set order.
    pub queried: Vec<TaskId>,
    /// Successful observations, in the same relative order as `queried`.
    pub snapshots: Vec<TaskSnapshot>,
    /// Ids whose query failed or returned a snapshot for another id.
    pub failed: Vec<TaskId>,
}

impl TickReport {
    /// At least one query was issued and none produced a snapshot.
    pub fn all_failed(&self) -> bool {
        !self.queried.is_empty() && self.snapshots.is_empty()
    }
}

/// Query every id concurrently and wait for all of them to settle.
///
/// Failures are logged and recorded per id; they are not retried within the
/// tick.
pub async fn fetch_all<Q>(query: &Q, ids: &[TaskId]) -> TickReport
where
    Q: StatusQuery + ?Sized,
{
    let pending = ids.iter().map(|id| async move { (id, query.query(id).await) });
    let results = join_all(pending).await;

    let mut report = TickReport {
        queried: ids.to_vec(),
        ..TickReport::default()
    };

    for (id, result) in results {
        match result {
            Ok(snapshot) if snapshot.id == *id => {
                debug!(task = %id, status = %snapshot.status, "status query succeeded");
                report.snapshots.push(snapshot);
            }
            Ok(snapshot) => {
                warn!(
                    task = %id,
                    returned_id = %snapshot.id,
                    "status query returned a snapshot for a different task; ignoring"
                );
                report.failed.push(id.clone());
            }
            Err(err) => {
                warn!(task = %id, error = %err, "status query failed");
                report.failed.push(id.clone());
            }
        }
    }

    report
}
