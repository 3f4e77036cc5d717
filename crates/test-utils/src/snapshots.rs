//! Shorthand constructors for snapshots.

use taskpoll::types::{TaskSnapshot, TaskStatus};

pub fn pending(id: &str) -> TaskSnapshot {
    TaskSnapshot::new(id, TaskStatus::Pending)
}

pub fn running(id: &str) -> TaskSnapshot {
    TaskSnapshot::new(id, TaskStatus::Running)
}

pub fn succeeded(id: &str) -> TaskSnapshot {
    TaskSnapshot::new(id, TaskStatus::Succeeded)
        .with_field("image_urls", serde_json::json!([format!("https://img.example/{id}.png")]))
}

pub fn failed(id: &str) -> TaskSnapshot {
    TaskSnapshot::new(id, TaskStatus::Failed).with_field("error_message", "upstream error")
}
