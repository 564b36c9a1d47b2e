// Base modules
pub mod consts;
pub mod config;
pub mod dir;

// Snapshots: naming/copy, retention, restore
pub mod snapshot;
pub mod retention;
pub mod restore;

// Instance lock and background watcher
pub mod lock;
pub mod watcher;

// Facade, interactive session and CLI wiring
pub mod keeper;
pub mod session;
pub mod cli;

// Convenience re-exports
pub use config::KeeperConfig;
pub use dir::{MtimeBaseline, SaveDir};
pub use keeper::{save_cycle, SaveKeeper};
pub use lock::{try_acquire_instance_lock, InstanceLock, LockAttempt};
pub use restore::RestoreOutcome;
pub use retention::{cleanup, delete_old_files, list_snapshots, CleanupReport, RetentionPolicy};
pub use snapshot::{create_snapshot, SnapshotEntry, SnapshotKind};
pub use watcher::{ChangeDetector, Watcher};
