// tests/watch_set_and_visibility.rs

use std::error::Error;
use std::fs;
use std::time::Duration;

use tempfile::tempdir;
use tokio::time::timeout;

use taskpoll::types::{TaskSnapshot, TaskStatus};
use taskpoll::visibility::{spawn_pause_file_watcher, VisibilitySignal};
use taskpoll::watchset::{CompletedSet, WatchSetHandle};
use taskpoll_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn completed_set_records_terminal_snapshots_once() {
    let mut completed = CompletedSet::new();

    assert!(!completed.record(&TaskSnapshot::new("t1", TaskStatus::Running)));
    assert!(completed.is_empty());

    assert!(completed.record(&TaskSnapshot::new("t1", TaskStatus::Succeeded)));
    assert!(!completed.record(&TaskSnapshot::new("t1", TaskStatus::Failed)));
    assert_eq!(completed.len(), 1);

    assert!(!completed.record(&TaskSnapshot::new("  ", TaskStatus::Failed)));
    assert_eq!(completed.len(), 1);

    completed.clear();
    assert!(!completed.contains("t1"));
}

#[test]
fn watch_set_handle_edits_notify_subscribers() {
    let handle = WatchSetHandle::new(["t1"]);
    let mut reader = handle.subscribe();

    handle.push("t1");
    assert!(!reader.has_changed().unwrap(), "duplicate push is not a change");

    handle.push("t2");
    assert!(reader.has_changed().unwrap());
    assert_eq!(*reader.borrow_and_update(), vec!["t1", "t2"]);

    assert!(handle.remove("t1"));
    assert!(!handle.remove("t1"));
    assert_eq!(handle.snapshot(), vec!["t2"]);

    handle.replace(Vec::<String>::new());
    assert!(handle.is_empty());
}

#[test]
fn visibility_signal_only_reports_transitions() {
    let signal = VisibilitySignal::default();
    let mut reader = signal.subscribe();

    assert!(signal.is_visible());
    assert!(!signal.set_visible(true));
    assert!(!reader.has_changed().unwrap());

    assert!(signal.set_visible(false));
    assert!(reader.has_changed().unwrap());
    assert!(!*reader.borrow_and_update());
}

#[tokio::test]
async fn existing_pause_file_starts_hidden() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let pause = dir.path().join("paused");
    fs::write(&pause, "")?;

    let signal = VisibilitySignal::new(true);
    let handle = spawn_pause_file_watcher(&pause, signal.clone())?;

    assert!(!signal.is_visible());
    assert_eq!(handle.path(), pause.as_path());
    Ok(())
}

#[tokio::test]
async fn pause_file_toggles_visibility() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let pause = dir.path().join("paused");

    let signal = VisibilitySignal::new(true);
    let mut reader = signal.subscribe();
    let _handle = spawn_pause_file_watcher(&pause, signal.clone())?;
    assert!(signal.is_visible());

    fs::write(&pause, "")?;
    timeout(Duration::from_secs(5), reader.wait_for(|visible| !*visible)).await??;

    fs::remove_file(&pause)?;
    timeout(Duration::from_secs(5), reader.wait_for(|visible| *visible)).await??;
    Ok(())
}
