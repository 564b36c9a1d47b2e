//! SaveKeeper, the operations the session drives:
//! save / load / undo, the instance lock, the latest-save query and the watcher.

use anyhow::Result;
use log::{debug, warn};
use std::path::PathBuf;

use crate::config::KeeperConfig;
use crate::dir::SaveDir;
use crate::lock::{try_acquire_instance_lock, LockAttempt};
use crate::restore::{self, RestoreOutcome};
use crate::retention::{cleanup, list_snapshots, RetentionPolicy};
use crate::snapshot::{create_snapshot, SnapshotKind};
use crate::watcher::Watcher;

/// Save snapshot followed by cleanup. Cleanup runs even when the copy failed;
/// its own errors are logged, the copy's error is returned.
pub fn save_cycle(dir: &SaveDir, policy: &RetentionPolicy) -> Result<PathBuf> {
    let saved = create_snapshot(dir, SnapshotKind::Save);
    cleanup_after_save(dir, policy);
    saved
}

pub(crate) fn cleanup_after_save(dir: &SaveDir, policy: &RetentionPolicy) {
    if let Err(e) = cleanup(dir, policy) {
        debug!("cleanup after save failed: {:#}", e);
    }
}

pub struct SaveKeeper {
    dir: SaveDir,
    cfg: KeeperConfig,
}

impl SaveKeeper {
    pub fn open(cfg: KeeperConfig) -> Result<Self> {
        let dir = SaveDir::open(&cfg.save_dir, &cfg.active_file)?;
        debug!("keeper: open {}", cfg);
        Ok(Self { dir, cfg })
    }

    pub fn dir(&self) -> &SaveDir {
        &self.dir
    }

    pub fn try_lock(&self) -> LockAttempt {
        try_acquire_instance_lock(self.dir.root())
    }

    /// Manual Save snapshot (plus cleanup).
    pub fn save(&self) -> Result<PathBuf> {
        save_cycle(&self.dir, &self.cfg.retention())
    }

    /// Backup, then restore the newest Save.
    pub fn load(&self) -> Result<RestoreOutcome> {
        restore::load(&self.dir)
    }

    /// Reserved for "restore the Backup made by the last load". Does nothing yet.
    pub fn undo(&self) {
        debug!("undo: not implemented, nothing changed");
    }

    /// Name of the newest Save snapshot, for display. Listing errors read as "none".
    pub fn latest_save_name(&self) -> Option<String> {
        match list_snapshots(&self.dir) {
            Ok(listing) => listing.latest_save().map(|e| e.name.clone()),
            Err(e) => {
                warn!("list snapshots failed: {:#}", e);
                None
            }
        }
    }

    /// A watcher bound to this directory with the configured timings.
    pub fn watcher(&self) -> Watcher {
        Watcher::new(
            self.dir.clone(),
            self.cfg.retention(),
            self.cfg.check_interval(),
            self.cfg.debounce(),
        )
    }
}
