//! Retention: classify snapshots and drop the oldest beyond per-kind caps.
//!
//! - Directory order is not trusted; lists are sorted oldest-first by the stamp
//!   embedded in the name (unstamped names first, ties by name).
//! - delete_old_files keeps exactly `keep` newest entries.
//! - Save and Backup caps are applied independently.
//! - Deletion is best-effort: failures are logged at debug level and skipped.

use anyhow::{Context, Result};
use log::debug;
use std::fs;

use crate::dir::SaveDir;
use crate::snapshot::{SnapshotEntry, SnapshotKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_kept_saves: usize,
    pub max_kept_backups: usize,
}

impl RetentionPolicy {
    pub fn new(max_kept_saves: usize, max_kept_backups: usize) -> Self {
        Self {
            max_kept_saves,
            max_kept_backups,
        }
    }
}

/// Snapshots found in the save directory, each list oldest-first.
#[derive(Debug, Default, Clone)]
pub struct SnapshotListing {
    pub saves: Vec<SnapshotEntry>,
    pub backups: Vec<SnapshotEntry>,
}

impl SnapshotListing {
    pub fn latest_save(&self) -> Option<&SnapshotEntry> {
        self.saves.last()
    }

    pub fn latest_backup(&self) -> Option<&SnapshotEntry> {
        self.backups.last()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub saves_removed: usize,
    pub backups_removed: usize,
}

fn sort_oldest_first(list: &mut [SnapshotEntry]) {
    list.sort_by(|a, b| a.stamp.cmp(&b.stamp).then_with(|| a.name.cmp(&b.name)));
}

/// Enumerate and classify the save directory.
pub fn list_snapshots(dir: &SaveDir) -> Result<SnapshotListing> {
    let root = dir.root();
    let mut listing = SnapshotListing::default();

    let rd = fs::read_dir(root).with_context(|| format!("read_dir {}", root.display()))?;
    for ent in rd {
        let ent = match ent {
            Ok(e) => e,
            Err(e) => {
                debug!("retention: skip unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };
        let name = match ent.file_name().into_string() {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(entry) = SnapshotEntry::from_name(root, &name, dir.active_name()) {
            match entry.kind {
                SnapshotKind::Save => listing.saves.push(entry),
                SnapshotKind::Backup => listing.backups.push(entry),
            }
        }
    }

    sort_oldest_first(&mut listing.saves);
    sort_oldest_first(&mut listing.backups);
    Ok(listing)
}

/// Delete the oldest entries of an oldest-first list so that `keep` remain.
/// Returns how many files were actually removed.
pub fn delete_old_files(list: &[SnapshotEntry], keep: usize) -> usize {
    if list.len() <= keep {
        return 0;
    }
    let mut removed = 0usize;
    for entry in &list[..list.len() - keep] {
        match fs::remove_file(&entry.path) {
            Ok(()) => {
                debug!("retention: removed {}", entry.path.display());
                removed += 1;
            }
            Err(e) => debug!("retention: remove {} failed: {}", entry.path.display(), e),
        }
    }
    removed
}

/// Apply the policy to the whole directory.
pub fn cleanup(dir: &SaveDir, policy: &RetentionPolicy) -> Result<CleanupReport> {
    let listing = list_snapshots(dir)?;
    let report = CleanupReport {
        saves_removed: delete_old_files(&listing.saves, policy.max_kept_saves),
        backups_removed: delete_old_files(&listing.backups, policy.max_kept_backups),
    };
    if report.saves_removed + report.backups_removed > 0 {
        debug!(
            "retention: cleanup removed saves={}, backups={} in {}",
            report.saves_removed,
            report.backups_removed,
            dir.root().display()
        );
    }
    Ok(report)
}
