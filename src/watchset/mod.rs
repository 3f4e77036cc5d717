// src/watchset/mod.rs

//! Watch set management.
//!
//! The watch set is the caller-owned, ordered list of task ids to observe.
//! It may grow, shrink or be replaced wholesale between any two ticks, so
//! the engine reads it fresh on every tick through a [`WatchSetHandle`].
//!
//! The [`CompletedSet`] is owned by the engine and scoped to one polling
//! session; together they determine which ids are still active.

pub mod completed;
pub mod shared;

pub use completed::{active_ids, CompletedSet};
pub use shared::{WatchSetHandle, WatchSetReader};
