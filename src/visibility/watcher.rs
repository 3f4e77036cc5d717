// src/visibility/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info};

use crate::errors::Result;
use crate::visibility::VisibilitySignal;

/// Handle for the pause-file watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle stops watching.
pub struct PauseFileHandle {
    _inner: RecommendedWatcher,
    path: PathBuf,
}

impl std::fmt::Debug for PauseFileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PauseFileHandle")
            .field("path", &self.path)
            .finish()
    }
}

impl PauseFileHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Treat the surface as hidden while `pause_file` exists.
///
/// The parent directory is watched (non-recursively) so that creating and
/// deleting the file are both observed. The signal is updated once up front
/// to reflect the current state of the file.
pub fn spawn_pause_file_watcher(
    pause_file: impl Into<PathBuf>,
    signal: VisibilitySignal,
) -> Result<PauseFileHandle> {
    let path = pause_file.into();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    signal.set_visible(!path.exists());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("taskpoll: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("taskpoll: pause file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    info!(path = ?path, visible = signal.is_visible(), "pause file watcher started");

    let file_name = path.file_name().map(|n| n.to_os_string());
    let async_path = path.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let touches_pause_file = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if !touches_pause_file {
                continue;
            }

            let visible = !async_path.exists();
            if signal.set_visible(visible) {
                info!(visible, "visibility changed via pause file");
            } else {
                debug!(visible, "pause file event without visibility change");
            }
        }

        debug!("pause file watcher loop ended");
    });

    Ok(PauseFileHandle {
        _inner: watcher,
        path,
    })
}
