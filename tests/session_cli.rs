// tests/session_cli.rs
//
// Run only this file:
//   cargo test --test session_cli -- --nocapture
//
// Runs the interactive session against in-memory input/output (watcher disabled):
// 1) save + exit: snapshot written, marker removed, farewell printed.
// 2) load without saves, unknown command, end of input.
// 3) Lock held by someone else: refusal text, no session, marker kept.
// 4) Marker cannot be created: reported, no session, still a normal goodbye.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use savekeeper::cli::run_with;
use savekeeper::lock::lock_file_path;
use savekeeper::{list_snapshots, try_acquire_instance_lock, KeeperConfig, SaveKeeper};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("sktest-session-{prefix}-{pid}-{t}-{id}"))
}

fn keeper_at(root: &PathBuf) -> Result<SaveKeeper> {
    let cfg = KeeperConfig::default().with_save_dir(root.clone());
    SaveKeeper::open(cfg)
}

fn run(keeper: &SaveKeeper, input: &str) -> Result<String> {
    let mut out = Vec::new();
    run_with(keeper, Cursor::new(input.as_bytes().to_vec()), &mut out, false)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn save_then_exit() -> Result<()> {
    let root = unique_root("save");
    fs::create_dir_all(&root)?;
    fs::write(root.join("DS2SOFS0000.sl2"), b"live")?;
    let keeper = keeper_at(&root)?;

    let text = run(&keeper, "s\nx\n")?;

    let listing = list_snapshots(keeper.dir())?;
    assert_eq!(listing.saves.len(), 1);
    let name = &listing.saves[0].name;
    assert!(text.contains("What would you like to do?"));
    assert!(text.contains(&format!("Saved {name}")));
    assert!(text.contains(&format!("Last save is {name}")));
    assert!(text.contains("[s] for save, [l] for load, [u] to undo load, [x] for exit"));
    assert!(text.contains("Exiting"));
    assert!(text.trim_end().ends_with("Bye!"));
    assert!(!lock_file_path(&root).exists());

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn load_unknown_undo_and_eof() -> Result<()> {
    let root = unique_root("misc");
    fs::create_dir_all(&root)?;
    fs::write(root.join("DS2SOFS0000.sl2"), b"live")?;
    let keeper = keeper_at(&root)?;

    // no trailing exit: end of input closes the session
    let text = run(&keeper, "l\nq\nu\n\n")?;

    assert!(text.contains("No saves located"));
    assert!(text.contains("Unknown command: q"));
    assert!(text.contains("Bye!"));
    assert_eq!(fs::read(root.join("DS2SOFS0000.sl2"))?, b"live");
    assert_eq!(list_snapshots(keeper.dir())?.backups.len(), 1);
    assert!(!lock_file_path(&root).exists());

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn failed_operations_are_reported_not_fatal() -> Result<()> {
    let root = unique_root("fail");
    fs::create_dir_all(&root)?;
    let keeper = keeper_at(&root)?;

    // no active file: both save and load fail but the session goes on
    let text = run(&keeper, "s\nl\nx\n")?;
    assert!(text.contains("Failed "));
    assert!(text.contains("Error: Error creating backup"));
    assert!(text.contains("Exiting"));
    assert!(text.contains("Bye!"));

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn held_lock_refuses_session() -> Result<()> {
    let root = unique_root("held");
    fs::create_dir_all(&root)?;
    let keeper = keeper_at(&root)?;

    let other = try_acquire_instance_lock(&root);
    assert!(other.is_acquired());

    let text = run(&keeper, "s\nx\n")?;
    assert!(text.contains("Lock file found"));
    assert!(text.contains("remove the lock file manually"));
    assert!(!text.contains("What would you like to do?"));
    assert!(text.contains("Bye!"));
    assert!(lock_file_path(&root).exists());
    assert!(list_snapshots(keeper.dir())?.saves.is_empty());

    drop(other);
    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn uncreatable_marker_ends_with_goodbye() -> Result<()> {
    let root = unique_root("nomarker");
    fs::create_dir_all(&root)?;
    fs::write(root.join("DS2SOFS0000.sl2"), b"live")?;
    let keeper = keeper_at(&root)?;

    // directory gone after open: creating the marker fails with NotFound
    fs::remove_dir_all(&root)?;

    let text = run(&keeper, "s\nx\n")?;
    assert!(text.contains("Unable to create lock file"));
    assert!(!text.contains("Lock file found"));
    assert!(!text.contains("What would you like to do?"));
    assert!(text.trim_end().ends_with("Bye!"));
    assert!(!root.exists());
    Ok(())
}
