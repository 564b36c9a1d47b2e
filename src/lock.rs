//! Instance lock: one running savekeeper per directory.
//!
//! The marker is a zero-byte file <root>/saves.lock whose presence blocks a second
//! instance. Creation is atomic (create_new), and while the session runs the
//! marker also carries an fs2 advisory exclusive lock. That lets a second process
//! tell a live holder from a marker left behind by a crash. A stale marker is
//! reported, never removed: the operator deletes it by hand.
//!
//! Any other error while creating the marker (permissions, missing or read-only
//! directory) is reported as Failed: the session does not start, but the
//! program still ends normally.
//!
//! Release deletes the marker; a failed delete is a warning only. Drop releases.

use fs2::FileExt;
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::consts::LOCK_FILE_NAME;

/// Outcome of an acquire attempt.
#[derive(Debug)]
pub enum LockAttempt {
    Acquired(InstanceLock),
    /// Marker present and advisory-locked by a live process.
    Held,
    /// Marker present but nobody holds it (unclean exit).
    Stale,
    /// Marker could not be created.
    Failed(io::Error),
}

impl LockAttempt {
    pub fn is_acquired(&self) -> bool {
        matches!(self, LockAttempt::Acquired(_))
    }
}

#[derive(Debug)]
pub struct InstanceLock {
    file: Option<File>,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the marker. Returns false (and warns) if it could not be deleted.
    pub fn release(mut self) -> bool {
        self.release_inner()
    }

    fn release_inner(&mut self) -> bool {
        let file = match self.file.take() {
            Some(f) => f,
            None => return true,
        };
        // unlock errors are irrelevant: the handle is closed right after
        let _ = file.unlock();
        drop(file);

        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("lock: released {}", self.path.display());
                true
            }
            Err(e) => {
                warn!("Unable to unlock the file {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        self.release_inner();
    }
}

pub fn lock_file_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE_NAME)
}

/// Try to become the running instance for `root`. Never touches an existing marker.
pub fn try_acquire_instance_lock(root: &Path) -> LockAttempt {
    let path = lock_file_path(root);
    let created = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path);

    match created {
        Ok(file) => {
            if let Err(e) = file.try_lock_exclusive() {
                // the marker is ours either way; advisory lock only sharpens Held/Stale
                debug!("lock: advisory lock on {} unavailable: {}", path.display(), e);
            }
            debug!("lock: acquired {}", path.display());
            LockAttempt::Acquired(InstanceLock {
                file: Some(file),
                path,
            })
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => inspect_existing(&path),
        Err(e) => {
            warn!("Unable to create lock file {}: {}", path.display(), e);
            LockAttempt::Failed(e)
        }
    }
}

fn inspect_existing(path: &Path) -> LockAttempt {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        // vanished or unreadable: treat as held, the user decides
        Err(_) => return LockAttempt::Held,
    };
    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = file.unlock();
            LockAttempt::Stale
        }
        Err(_) => LockAttempt::Held,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_attempt_flags() {
        assert!(!LockAttempt::Held.is_acquired());
        assert!(!LockAttempt::Stale.is_acquired());
        assert!(!LockAttempt::Failed(io::Error::from(ErrorKind::PermissionDenied)).is_acquired());
    }

    #[test]
    fn missing_directory_is_a_failed_attempt() {
        let root = std::env::temp_dir().join(format!("sklock-missing-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        match try_acquire_instance_lock(&root) {
            LockAttempt::Failed(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert!(!lock_file_path(&root).exists());
    }
}
