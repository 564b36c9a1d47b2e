//! Runtime settings of one savekeeper instance.
//!
//! - Defaults come from `consts`; KeeperConfig::from_env() layers SAVEKEEPER_*
//!   variables on top of them.
//! - Retention caps and watcher timings are handed to the operations that use
//!   them, never read from globals.
//! - `with_*` setters let tests pin caps and timings.
//!
//! Env variables:
//! - SAVEKEEPER_DIR               : directory holding the active file and snapshots (default ".")
//! - SAVEKEEPER_ACTIVE_FILE       : active file name inside the directory (default DS2SOFS0000.sl2)
//! - SAVEKEEPER_MAX_SAVES         : Save snapshots kept by cleanup (default 30)
//! - SAVEKEEPER_MAX_BACKUPS       : Backup snapshots kept by cleanup (default 60)
//! - SAVEKEEPER_CHECK_INTERVAL_MS : watcher poll interval (default 1000)
//! - SAVEKEEPER_DEBOUNCE_SECS     : minimal wall-clock gap between watcher snapshots (default 10)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::consts::{
    DEFAULT_ACTIVE_FILE, DEFAULT_CHECK_INTERVAL_MS, DEFAULT_DEBOUNCE_SECS,
    DEFAULT_MAX_KEPT_BACKUPS, DEFAULT_MAX_KEPT_SAVES, DEFAULT_SAVE_DIR,
};
use crate::retention::RetentionPolicy;

/// Top-level configuration for one savekeeper instance.
#[derive(Clone, Debug)]
pub struct KeeperConfig {
    /// Directory with the active file, snapshots and the lock marker.
    /// Env: SAVEKEEPER_DIR
    pub save_dir: PathBuf,

    /// File name of the game's live save inside `save_dir`.
    /// Env: SAVEKEEPER_ACTIVE_FILE
    pub active_file: String,

    /// Env: SAVEKEEPER_MAX_SAVES
    pub max_kept_saves: usize,

    /// Env: SAVEKEEPER_MAX_BACKUPS
    pub max_kept_backups: usize,

    /// Watcher poll interval in milliseconds.
    /// Env: SAVEKEEPER_CHECK_INTERVAL_MS
    pub check_interval_ms: u64,

    /// Wall-clock seconds that must pass between two watcher snapshots.
    /// 0 snapshots on every tick that sees a newer mtime.
    /// Env: SAVEKEEPER_DEBOUNCE_SECS
    pub debounce_secs: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            active_file: DEFAULT_ACTIVE_FILE.to_string(),
            max_kept_saves: DEFAULT_MAX_KEPT_SAVES,
            max_kept_backups: DEFAULT_MAX_KEPT_BACKUPS,
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
        }
    }
}

impl KeeperConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, but with an arbitrary variable source.
    /// Unparsable numbers keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("SAVEKEEPER_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.save_dir = PathBuf::from(s);
            }
        }
        if let Some(v) = lookup("SAVEKEEPER_ACTIVE_FILE") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.active_file = s.to_string();
            }
        }

        if let Some(n) = lookup("SAVEKEEPER_MAX_SAVES").and_then(|v| v.trim().parse::<usize>().ok()) {
            cfg.max_kept_saves = n;
        }
        if let Some(n) = lookup("SAVEKEEPER_MAX_BACKUPS").and_then(|v| v.trim().parse::<usize>().ok()) {
            cfg.max_kept_backups = n;
        }
        if let Some(n) =
            lookup("SAVEKEEPER_CHECK_INTERVAL_MS").and_then(|v| v.trim().parse::<u64>().ok())
        {
            // a zero interval would spin the watcher
            cfg.check_interval_ms = n.max(1);
        }
        if let Some(n) = lookup("SAVEKEEPER_DEBOUNCE_SECS").and_then(|v| v.trim().parse::<u64>().ok()) {
            cfg.debounce_secs = n;
        }

        cfg
    }

    pub fn with_save_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.save_dir = dir.into();
        self
    }

    pub fn with_active_file<S: Into<String>>(mut self, name: S) -> Self {
        self.active_file = name.into();
        self
    }

    pub fn with_max_kept_saves(mut self, n: usize) -> Self {
        self.max_kept_saves = n;
        self
    }

    pub fn with_max_kept_backups(mut self, n: usize) -> Self {
        self.max_kept_backups = n;
        self
    }

    pub fn with_check_interval_ms(mut self, ms: u64) -> Self {
        self.check_interval_ms = ms.max(1);
        self
    }

    pub fn with_debounce_secs(mut self, secs: u64) -> Self {
        self.debounce_secs = secs;
        self
    }

    /// Retention caps as an explicit value for cleanup calls.
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.max_kept_saves, self.max_kept_backups)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}

impl fmt::Display for KeeperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KeeperConfig {{ \
             save_dir: {}, \
             active_file: {}, \
             max_kept_saves: {}, \
             max_kept_backups: {}, \
             check_interval_ms: {}, \
             debounce_secs: {} \
             }}",
            self.save_dir.display(),
            self.active_file,
            self.max_kept_saves,
            self.max_kept_backups,
            self.check_interval_ms,
            self.debounce_secs,
        )
    }
}
