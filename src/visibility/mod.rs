// src/visibility/mod.rs

//! "Is the consuming surface visible?" signal.
//!
//! The engine subscribes to a [`VisibilityReader`] and reacts to the moment
//! of transition: hidden surfaces are polled coarsely, and becoming visible
//! again triggers an immediate tick.
//!
//! - [`VisibilitySignal`] is the producer side; anything that knows about
//!   foreground/background (a UI shell, a terminal, a file) drives it.
//! - [`watcher`] drives it from a pause file on disk using `notify`.

use tokio::sync::watch;

pub mod watcher;

pub use watcher::{spawn_pause_file_watcher, PauseFileHandle};

/// Engine-side view of the visibility signal.
pub type VisibilityReader = watch::Receiver<bool>;

/// Producer side of the visibility signal.
#[derive(Debug, Clone)]
pub struct VisibilitySignal {
    tx: watch::Sender<bool>,
}

impl VisibilitySignal {
    pub fn new(visible: bool) -> Self {
        let (tx, _rx) = watch::channel(visible);
        Self { tx }
    }

    /// Record the current visibility. Subscribers are only woken on an
    /// actual transition.
    pub fn set_visible(&self, visible: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == visible {
                false
            } else {
                *current = visible;
                true
            }
        })
    }

    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> VisibilityReader {
        self.tx.subscribe()
    }
}

impl Default for VisibilitySignal {
    fn default() -> Self {
        Self::new(true)
    }
}

/// A reader that is visible forever (for callers with no notion of
/// visibility).
pub fn always_visible() -> VisibilityReader {
    let (_tx, rx) = watch::channel(true);
    rx
}
