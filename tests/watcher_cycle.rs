// tests/watcher_cycle.rs
//
// Run only this file:
//   cargo test --test watcher_cycle -- --nocapture
//
// Drives Watcher::tick_at directly instead of the background thread:
// 1) No mtime change -> no snapshot; a newer mtime -> Save snapshot + retention.
// 2) Missing active file skips ticks; once it appears it is snapshotted.
// 3) Debounce: a change inside the window stays pending and fires after it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;

use savekeeper::{list_snapshots, RetentionPolicy, SaveDir, Watcher};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("sktest-watch-{prefix}-{pid}-{t}-{id}"))
}

const ACTIVE: &str = "DS2SOFS0000.sl2";

fn write_with_mtime(path: &Path, bytes: &[u8], ahead: Duration) -> Result<()> {
    fs::write(path, bytes)?;
    let f = fs::OpenOptions::new().write(true).open(path)?;
    f.set_modified(SystemTime::now() + ahead)?;
    Ok(())
}

#[test]
fn change_triggers_save_and_cleanup() -> Result<()> {
    let root = unique_root("change");
    fs::create_dir_all(&root)?;
    let active = root.join(ACTIVE);
    fs::write(&active, b"v0")?;
    for name in ["0101_000000.sav", "0101_000001.sav", "0101_000002.sav"] {
        fs::write(root.join(name), b"old")?;
    }

    let dir = SaveDir::open(&root, ACTIVE)?;
    let mut w = Watcher::new(
        dir.clone(),
        RetentionPolicy::new(2, 60),
        Duration::from_millis(10),
        Duration::ZERO,
    );
    let now = Instant::now();

    assert!(w.tick_at(now).is_none());
    assert_eq!(list_snapshots(&dir)?.saves.len(), 3);

    write_with_mtime(&active, b"v1", Duration::from_secs(5))?;
    let saved = w.tick_at(now).expect("change must be snapshotted");
    assert_eq!(fs::read(&saved)?, b"v1");

    // cap 2: the new snapshot plus the newest old one remain
    let names: Vec<String> = list_snapshots(&dir)?.saves.into_iter().map(|e| e.name).collect();
    assert_eq!(names.len(), 2);
    assert_eq!(names[0], "0101_000002.sav");
    assert_eq!(root.join(&names[1]), saved);

    // same mtime again: nothing new
    assert!(w.tick_at(now).is_none());

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn missing_active_file_skips_until_it_appears() -> Result<()> {
    let root = unique_root("appear");
    fs::create_dir_all(&root)?;
    let dir = SaveDir::open(&root, ACTIVE)?;
    let mut w = Watcher::new(
        dir.clone(),
        RetentionPolicy::new(30, 60),
        Duration::from_millis(10),
        Duration::from_secs(10),
    );
    assert!(w.detector().recorded().is_none());

    assert!(w.tick().is_none());
    assert!(w.tick().is_none());

    fs::write(root.join(ACTIVE), b"first write")?;
    let saved = w.tick().expect("first appearance is a change");
    assert_eq!(fs::read(&saved)?, b"first write");
    assert!(w.detector().recorded().is_some());

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn debounce_defers_changes_inside_window() -> Result<()> {
    let root = unique_root("debounce");
    fs::create_dir_all(&root)?;
    let active = root.join(ACTIVE);
    fs::write(&active, b"v0")?;

    let dir = SaveDir::open(&root, ACTIVE)?;
    let mut w = Watcher::new(
        dir.clone(),
        RetentionPolicy::new(30, 60),
        Duration::from_millis(10),
        Duration::from_secs(60),
    );
    let start = Instant::now();

    write_with_mtime(&active, b"v1", Duration::from_secs(5))?;
    assert!(w.tick_at(start).is_some());

    write_with_mtime(&active, b"v2", Duration::from_secs(10))?;
    assert!(w.tick_at(start + Duration::from_secs(30)).is_none());

    let saved = w
        .tick_at(start + Duration::from_secs(61))
        .expect("pending change fires after the window");
    assert_eq!(fs::read(&saved)?, b"v2");

    fs::remove_dir_all(&root)?;
    Ok(())
}
