//! Backup-then-restore ("load").
//!
//! Steps, each gating the next:
//! 1) begin: Backup snapshot of the active file; failure aborts with the file untouched.
//! 2) locate: newest Save snapshot by embedded stamp.
//! 3) apply: without a Save, stop and leave the active file as it was.
//!    Otherwise read the Save, delete the active file, write the Save's bytes
//!    in its place, and move the directory's mtime baseline to the restored file.
//! 4) consume: delete the Save that was loaded; a failed delete is a warning.
//!
//! The chain is split into types so a caller can run the steps one by one. The
//! writer guard is taken by `begin` and travels with the chain until `apply`
//! returns: a watcher tick that comes due meanwhile waits, then finds the
//! restored file already recorded and writes nothing.

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::MutexGuard;

use crate::dir::SaveDir;
use crate::retention::list_snapshots;
use crate::snapshot::{read_active, write_snapshot_at, SnapshotEntry, SnapshotKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored {
        /// Name of the Save that now is the active file.
        save: String,
        backup: PathBuf,
        /// false if the Save could not be deleted after loading.
        consumed: bool,
    },
    NoSaves {
        backup: PathBuf,
    },
}

impl RestoreOutcome {
    pub fn backup(&self) -> &Path {
        match self {
            RestoreOutcome::Restored { backup, .. } | RestoreOutcome::NoSaves { backup } => backup,
        }
    }
}

/// State after step 1.
#[derive(Debug)]
pub struct BackupTaken<'a> {
    dir: &'a SaveDir,
    _writer: MutexGuard<'a, ()>,
    backup: PathBuf,
}

/// State after step 2.
#[derive(Debug)]
pub struct Located<'a> {
    dir: &'a SaveDir,
    _writer: MutexGuard<'a, ()>,
    backup: PathBuf,
    save: Option<SnapshotEntry>,
}

/// Step 1.
pub fn begin(dir: &SaveDir) -> Result<BackupTaken<'_>> {
    let writer = dir.writer_guard();
    let bytes = read_active(dir).context("Error creating backup")?;
    let backup = write_snapshot_at(dir, SnapshotKind::Backup, &bytes, &Local::now())
        .context("Error creating backup")?;
    debug!("restore: pre-restore backup {}", backup.display());
    Ok(BackupTaken {
        dir,
        _writer: writer,
        backup,
    })
}

impl<'a> BackupTaken<'a> {
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Step 2.
    pub fn locate(self) -> Result<Located<'a>> {
        let listing = list_snapshots(self.dir).context("Error loading latest save")?;
        let save = listing.latest_save().cloned();
        Ok(Located {
            dir: self.dir,
            _writer: self._writer,
            backup: self.backup,
            save,
        })
    }
}

impl<'a> Located<'a> {
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    pub fn save(&self) -> Option<&SnapshotEntry> {
        self.save.as_ref()
    }

    /// Steps 3 and 4. The writer guard is released when this returns.
    pub fn apply(self) -> Result<RestoreOutcome> {
        let dir = self.dir;
        let save = match self.save {
            Some(s) => s,
            None => {
                info!("restore: no saves located, active file left in place");
                return Ok(RestoreOutcome::NoSaves {
                    backup: self.backup,
                });
            }
        };

        let active = dir.active_path();
        let bytes = fs::read(&save.path)
            .with_context(|| format!("Error loading latest save {}", save.path.display()))?;

        match fs::remove_file(&active) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Error loading latest save: remove {}", active.display())
                })
            }
        }
        fs::write(&active, &bytes).with_context(|| {
            format!(
                "Error loading latest save: write {} (previous state kept in {})",
                active.display(),
                self.backup.display()
            )
        })?;
        dir.baseline().set(dir.active_mtime());

        let consumed = match fs::remove_file(&save.path) {
            Ok(()) => true,
            Err(e) => {
                warn!("restore: loaded {} but could not delete it: {}", save.name, e);
                false
            }
        };

        Ok(RestoreOutcome::Restored {
            save: save.name,
            backup: self.backup,
            consumed,
        })
    }
}

/// Whole chain in one call.
pub fn load(dir: &SaveDir) -> Result<RestoreOutcome> {
    begin(dir)?.locate()?.apply()
}
