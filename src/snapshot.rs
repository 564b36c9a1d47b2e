//! Snapshotter: timestamp-named byte copies of the active file.
//!
//! Name format: MMDD_HHMMSS + suffix (".sav" for Save, ".bak" for Backup), local time.
//! Copy is read-then-write with truncate-create on the destination: two snapshots
//! of the same kind within one second overwrite each other.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use log::debug;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{BACKUP_SUFFIX, SAVE_SUFFIX, STAMP_FORMAT, STAMP_LEN};
use crate::dir::SaveDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Save,
    Backup,
}

impl SnapshotKind {
    pub fn suffix(self) -> &'static str {
        match self {
            SnapshotKind::Save => SAVE_SUFFIX,
            SnapshotKind::Backup => BACKUP_SUFFIX,
        }
    }

    /// Classify a directory entry name.
    ///
    /// Save wins when both suffixes are present. The active file is never a
    /// snapshot, whatever suffix its name carries.
    pub fn classify(name: &str, active_name: &str) -> Option<Self> {
        if name == active_name {
            None
        } else if name.contains(SAVE_SUFFIX) {
            Some(SnapshotKind::Save)
        } else if name.contains(BACKUP_SUFFIX) {
            Some(SnapshotKind::Backup)
        } else {
            None
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Save => f.write_str("save"),
            SnapshotKind::Backup => f.write_str("backup"),
        }
    }
}

/// One classified snapshot file in the save directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: SnapshotKind,
    /// MMDDHHMMSS parsed from the name; None if the name has no leading stamp.
    pub stamp: Option<u64>,
}

impl SnapshotEntry {
    pub fn from_name(root: &Path, name: &str, active_name: &str) -> Option<Self> {
        let kind = SnapshotKind::classify(name, active_name)?;
        Some(Self {
            name: name.to_string(),
            path: root.join(name),
            kind,
            stamp: parse_stamp(name),
        })
    }
}

/// Build a snapshot file name for the given instant.
pub fn snapshot_file_name<Tz: TimeZone>(kind: SnapshotKind, at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("{}{}", at.format(STAMP_FORMAT), kind.suffix())
}

/// Parse the leading "MMDD_HHMMSS" of a name into an ordering key MMDDHHMMSS.
pub fn parse_stamp(name: &str) -> Option<u64> {
    let head = name.as_bytes().get(..STAMP_LEN)?;
    let mut key = 0u64;
    for (i, b) in head.iter().enumerate() {
        if i == 4 {
            if *b != b'_' {
                return None;
            }
            continue;
        }
        if !b.is_ascii_digit() {
            return None;
        }
        key = key * 10 + u64::from(b - b'0');
    }
    Some(key)
}

/// Bytes of the active file. Callers hold the writer guard.
pub(crate) fn read_active(dir: &SaveDir) -> Result<Vec<u8>> {
    let src = dir.active_path();
    fs::read(&src).with_context(|| format!("read active file {}", src.display()))
}

/// Store `bytes` as a `kind` snapshot named after `at` (truncate-create).
pub(crate) fn write_snapshot_at<Tz: TimeZone>(
    dir: &SaveDir,
    kind: SnapshotKind,
    bytes: &[u8],
    at: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: fmt::Display,
{
    let dst = dir.root().join(snapshot_file_name(kind, at));
    fs::write(&dst, bytes)
        .with_context(|| format!("write {} snapshot {}", kind, dst.display()))?;
    debug!("snapshot: {} {} ({} B)", kind, dst.display(), bytes.len());
    Ok(dst)
}

/// Snapshot the active file as `kind`, named after the current local time.
pub fn create_snapshot(dir: &SaveDir, kind: SnapshotKind) -> Result<PathBuf> {
    create_snapshot_at(dir, kind, &Local::now())
}

/// Same as `create_snapshot` with an explicit timestamp.
pub fn create_snapshot_at<Tz: TimeZone>(
    dir: &SaveDir,
    kind: SnapshotKind,
    at: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: fmt::Display,
{
    let bytes = {
        let _g = dir.writer_guard();
        read_active(dir)?
    };
    write_snapshot_at(dir, kind, &bytes, at)
}
