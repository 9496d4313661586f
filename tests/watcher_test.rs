//! Watcher behaviour against the real filesystem and against a fake source.

use ghostkey::watcher::{ChangeKind, FileWatcher, ManualSource};
use ghostkey::{CodeStore, ConsumeMode, StorePaths};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn notify_channel() -> (mpsc::UnboundedReceiver<()>, impl Fn() + Send + Sync + 'static) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, move || {
        let _ = tx.send(());
    })
}

/// Wait for one callback, then swallow any stragglers from the same burst.
async fn expect_change(rx: &mut mpsc::UnboundedReceiver<()>, what: &str) {
    timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .unwrap_or_else(|_| panic!("no callback after {what}"))
        .expect("watcher channel closed");
    tokio::time::sleep(Duration::from_millis(300)).await;
    while rx.try_recv().is_ok() {}
}

#[tokio::test]
async fn test_notify_write_triggers_callback() {
    let temp_dir = TempDir::new().unwrap();
    let codes_path = temp_dir.path().join("codes.txt");
    fs::write(&codes_path, "111111\n").unwrap();

    let (mut rx, on_change) = notify_channel();
    let watcher = FileWatcher::builder()
        .path(&codes_path)
        .debounce_ms(50)
        .spawn(on_change)
        .unwrap();
    assert_eq!(watcher.active_count(), 1);

    fs::write(&codes_path, "111111\n222222\n").unwrap();
    expect_change(&mut rx, "in-place write").await;
}

#[tokio::test]
async fn test_notify_survives_rename_over() {
    let temp_dir = TempDir::new().unwrap();
    let codes_path = temp_dir.path().join("codes.txt");
    fs::write(&codes_path, "111111\n").unwrap();

    let (mut rx, on_change) = notify_channel();
    let _watcher = FileWatcher::builder()
        .path(&codes_path)
        .debounce_ms(50)
        .rebind_delay_ms(100)
        .spawn(on_change)
        .unwrap();

    // Editor-style save: write a sibling, rename it over the original
    let tmp_path = temp_dir.path().join("codes.txt.swp");
    fs::write(&tmp_path, "222222\n").unwrap();
    fs::rename(&tmp_path, &codes_path).unwrap();
    expect_change(&mut rx, "rename over").await;

    // Only a rebound watch sees writes to the replacement file
    fs::write(&codes_path, "222222\n333333\n").unwrap();
    expect_change(&mut rx, "write to replacement").await;
}

#[tokio::test]
async fn test_missing_path_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let codes_path = temp_dir.path().join("codes.txt");
    fs::write(&codes_path, "").unwrap();

    let (_rx, on_change) = notify_channel();
    let watcher = FileWatcher::builder()
        .paths(vec![temp_dir.path().join("absent.txt"), codes_path.clone()])
        .spawn(on_change)
        .unwrap();

    assert_eq!(watcher.active_count(), 1);
    assert_eq!(
        watcher.paths(),
        vec![temp_dir.path().join("absent.txt"), codes_path]
    );
}

#[tokio::test(start_paused = true)]
async fn test_store_follows_external_edits() {
    let temp_dir = TempDir::new().unwrap();
    let codes_path = temp_dir.path().join("codes.txt");
    fs::write(&codes_path, "111111\n").unwrap();

    let store = Arc::new(CodeStore::new(
        StorePaths::new(&codes_path, temp_dir.path().join("index.json")),
        ConsumeMode::Destructive,
    ));
    store.load_all();

    let source = ManualSource::new();
    let reloading = Arc::clone(&store);
    let _watcher = FileWatcher::builder()
        .source(source.clone())
        .paths(store.watched_paths())
        .spawn(move || reloading.load_all())
        .unwrap();

    // A burst of writes from another process
    fs::write(&codes_path, "111111\n222222\n333333\n").unwrap();
    for _ in 0..3 {
        source.emit(&codes_path, ChangeKind::Write);
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.remaining(), 3);

    // Replaced by an editor
    fs::write(&codes_path, "444444\n").unwrap();
    source.emit(&codes_path, ChangeKind::Rename);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(store.peek_next().as_deref(), Some("444444"));
    assert_eq!(source.watch_calls(&codes_path), 2);
}

#[tokio::test(start_paused = true)]
async fn test_relocation_moves_watches() {
    let temp_dir = TempDir::new().unwrap();
    let old_dir = temp_dir.path().join("old");
    let new_dir = temp_dir.path().join("new");

    let store = Arc::new(CodeStore::new(
        StorePaths::new(old_dir.join("codes.txt"), old_dir.join("index.json")),
        ConsumeMode::Indexed,
    ));
    store.bootstrap_if_needed().unwrap();

    let source = ManualSource::new();
    let (mut rx, on_change) = notify_channel();
    let watcher = FileWatcher::builder()
        .source(source.clone())
        .paths(store.watched_paths())
        .spawn(on_change)
        .unwrap();
    assert_eq!(source.total_active(), 2);

    store.relocate(
        StorePaths::new(new_dir.join("codes.txt"), new_dir.join("index.json")),
        ConsumeMode::Destructive,
    );
    store.bootstrap_if_needed().unwrap();
    assert_eq!(watcher.update_paths(store.watched_paths()), 1);

    assert_eq!(source.active_watches(old_dir.join("codes.txt")), 0);
    assert_eq!(source.active_watches(old_dir.join("index.json")), 0);
    assert_eq!(watcher.paths(), vec![new_dir.join("codes.txt")]);

    source.emit(new_dir.join("codes.txt"), ChangeKind::Write);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_ok());
}
