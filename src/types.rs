// src/types.rs

//! Task identifiers, statuses and the snapshots returned by status queries.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Opaque task identifier, unique within a watch session.
pub type TaskId = String;

/// Lifecycle status of an image-generation task.
///
/// `Succeeded` and `Failed` are terminal: once observed, the task is never
/// queried again for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }

    /// Pending or running. These keep the adaptive interval growing.
    pub fn is_in_flight(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload returned by a status query.
///
/// The poller only interprets `id` and `status`; every other field of the
/// payload is kept verbatim in `fields` so callbacks can render whatever the
/// server sent (model, prompt, image URLs, progress, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub status: TaskStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TaskSnapshot {
    pub fn new(id: impl Into<TaskId>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            status,
            fields: Map::new(),
        }
    }

    /// Attach an extra payload field (builder style).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// A snapshot without an id cannot be attributed to any task.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn model(&self) -> Option<&str> {
        self.str_field("model_id").or_else(|| self.str_field("model"))
    }

    pub fn prompt(&self) -> Option<&str> {
        self.str_field("prompt")
    }

    pub fn error_message(&self) -> Option<&str> {
        self.str_field("error_message").filter(|s| !s.is_empty())
    }

    /// Result image references; empty until the task succeeds.
    pub fn image_urls(&self) -> Vec<&str> {
        match self.fields.get("image_urls") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Progress percentage, when the backend reports one.
    pub fn progress(&self) -> Option<f64> {
        self.fields.get("progress").and_then(Value::as_f64)
    }

    pub fn attempts(&self) -> Option<u64> {
        self.fields.get("attempts").and_then(Value::as_u64)
    }

    /// Unix timestamp (seconds) at which the task reached a terminal state.
    pub fn completed_at(&self) -> Option<i64> {
        self.fields.get("completed_at").and_then(Value::as_i64)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

impl<'de> Deserialize<'de> for TaskSnapshot {
    /// Accepts both the task model shape (`id`) and the API response shape
    /// (`task_id`). A missing id decodes as empty and is rejected later by
    /// the watch set as malformed.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;

        let status_value = fields
            .remove("status")
            .ok_or_else(|| serde::de::Error::missing_field("status"))?;
        let status = TaskStatus::deserialize(status_value).map_err(serde::de::Error::custom)?;

        let id = match (fields.remove("id"), fields.remove("task_id")) {
            (Some(Value::String(id)), _) if !id.is_empty() => id,
            (_, Some(Value::String(id))) => id,
            _ => TaskId::new(),
        };

        Ok(Self { id, status, fields })
    }
}
