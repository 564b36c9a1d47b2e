//! Shared names and defaults (active file, snapshot naming, lock marker, timings).

// -------- Active file --------
pub const DEFAULT_ACTIVE_FILE: &str = "DS2SOFS0000.sl2";
pub const DEFAULT_SAVE_DIR: &str = ".";

// -------- Snapshots --------
pub const SAVE_SUFFIX: &str = ".sav";
pub const BACKUP_SUFFIX: &str = ".bak";
// chrono strftime; produces MMDD_HHMMSS
pub const STAMP_FORMAT: &str = "%m%d_%H%M%S";
pub const STAMP_LEN: usize = 11; // "MMDD_HHMMSS"

// -------- Retention --------
pub const DEFAULT_MAX_KEPT_SAVES: usize = 30;
pub const DEFAULT_MAX_KEPT_BACKUPS: usize = 60;

// -------- Watcher --------
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_DEBOUNCE_SECS: u64 = 10;

// -------- Lock --------
pub const LOCK_FILE_NAME: &str = "saves.lock";
