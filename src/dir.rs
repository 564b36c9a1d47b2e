//! SaveDir: handle to the working directory.
//!
//! Layout (flat, everything lives directly in the root):
//!   <root>/<active file>     : owned by the game
//!   <root>/MMDD_HHMMSS.sav   : Save snapshots
//!   <root>/MMDD_HHMMSS.bak   : Backup snapshots
//!   <root>/saves.lock        : instance marker
//!
//! Clones share one single-writer guard and one mtime baseline. Watcher ticks and
//! the whole load sequence run under the guard, so the watcher thread never copies
//! a half-restored file. A load moves the baseline to the restored file's mtime:
//! the watcher treats its own restore as already seen.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

/// Last active-file mtime accounted for by a snapshot or a restore.
#[derive(Clone, Debug, Default)]
pub struct MtimeBaseline(Arc<Mutex<Option<SystemTime>>>);

impl MtimeBaseline {
    pub fn new(initial: Option<SystemTime>) -> Self {
        Self(Arc::new(Mutex::new(initial)))
    }

    pub fn get(&self) -> Option<SystemTime> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set(&self, mtime: Option<SystemTime>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = mtime;
    }
}

#[derive(Clone, Debug)]
pub struct SaveDir {
    root: PathBuf,
    active_name: String,
    writer: Arc<Mutex<()>>,
    baseline: MtimeBaseline,
}

impl SaveDir {
    /// Open an existing directory. The active file itself may be missing.
    pub fn open(root: &Path, active_name: &str) -> Result<Self> {
        let meta = fs::metadata(root)
            .with_context(|| format!("stat save dir {}", root.display()))?;
        if !meta.is_dir() {
            return Err(anyhow!("{} is not a directory", root.display()));
        }
        if active_name.is_empty() {
            return Err(anyhow!("active file name must not be empty"));
        }
        Ok(Self {
            root: root.to_path_buf(),
            active_name: active_name.to_string(),
            writer: Arc::new(Mutex::new(())),
            baseline: MtimeBaseline::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn active_name(&self) -> &str {
        &self.active_name
    }

    pub fn active_path(&self) -> PathBuf {
        self.root.join(&self.active_name)
    }

    /// Modification time of the active file; None if it is missing or unreadable.
    pub fn active_mtime(&self) -> Option<SystemTime> {
        fs::metadata(self.active_path())
            .and_then(|m| m.modified())
            .ok()
    }

    /// Enter the single-writer region around the active file.
    /// A poisoned guard is still usable: it protects no data of its own.
    pub(crate) fn writer_guard(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn baseline(&self) -> &MtimeBaseline {
        &self.baseline
    }
}
