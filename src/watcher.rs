//! Watcher: background poll of the active file's mtime.
//!
//! Each tick re-reads the mtime (a failed stat skips the tick). A newer mtime than
//! the recorded one is a change. Changes are acted on at most once per debounce
//! window of wall-clock time; a change that arrives inside the window stays
//! pending (the recorded mtime is not advanced) and is picked up by the first tick
//! after the window closes. With a zero window every changed tick snapshots.
//!
//! Acting means: record the new mtime, then run the Save cycle
//! (Save snapshot + retention cleanup). The stat, the decision and the read of the
//! active file happen under the directory's writer guard, so a tick never
//! interleaves with a load. The recorded mtime is the directory's shared
//! baseline, which a load moves to the restored file's mtime.
//!
//! The loop has no stop signal; it lives as long as the process.

use chrono::Local;
use log::{debug, info, trace, warn};
use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use crate::dir::{MtimeBaseline, SaveDir};
use crate::keeper::cleanup_after_save;
use crate::retention::RetentionPolicy;
use crate::snapshot::{read_active, write_snapshot_at, SnapshotKind};

/// Change/debounce state, fed with observed mtimes.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    recorded: MtimeBaseline,
    last_action: Option<Instant>,
    debounce: Duration,
}

impl ChangeDetector {
    pub fn new(recorded: MtimeBaseline, debounce: Duration) -> Self {
        Self {
            recorded,
            last_action: None,
            debounce,
        }
    }

    pub fn recorded(&self) -> Option<SystemTime> {
        self.recorded.get()
    }

    /// True if `mtime` is a change that may be acted on at `now`. Does not record.
    pub fn is_due(&self, mtime: SystemTime, now: Instant) -> bool {
        let changed = match self.recorded.get() {
            None => true,
            Some(prev) => match mtime.duration_since(prev) {
                Ok(delta) if delta > Duration::ZERO => {
                    debug!("watcher: save changed, diff {:.3}s", delta.as_secs_f64());
                    true
                }
                _ => false,
            },
        };
        if !changed {
            return false;
        }

        if let Some(last) = self.last_action {
            if now.saturating_duration_since(last) < self.debounce {
                trace!("watcher: change pending, inside debounce window");
                return false;
            }
        }
        true
    }

    pub fn mark(&mut self, mtime: SystemTime, now: Instant) {
        self.recorded.set(Some(mtime));
        self.last_action = Some(now);
    }

    /// Feed one observation; true means "snapshot now".
    pub fn observe(&mut self, mtime: SystemTime, now: Instant) -> bool {
        if !self.is_due(mtime, now) {
            return false;
        }
        self.mark(mtime, now);
        true
    }
}

pub struct Watcher {
    dir: SaveDir,
    policy: RetentionPolicy,
    interval: Duration,
    detector: ChangeDetector,
}

impl Watcher {
    /// Record the current mtime as baseline (unset if the active file is missing).
    pub fn new(dir: SaveDir, policy: RetentionPolicy, interval: Duration, debounce: Duration) -> Self {
        dir.baseline().set(dir.active_mtime());
        let detector = ChangeDetector::new(dir.baseline().clone(), debounce);
        Self {
            dir,
            policy,
            interval,
            detector,
        }
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// One poll. Returns the Save snapshot path if one was written.
    pub fn tick(&mut self) -> Option<PathBuf> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<PathBuf> {
        let bytes = {
            let _g = self.dir.writer_guard();
            let mtime = match self.dir.active_mtime() {
                Some(t) => t,
                None => {
                    trace!("watcher: active file unavailable, skip tick");
                    return None;
                }
            };
            if !self.detector.is_due(mtime, now) {
                return None;
            }
            match read_active(&self.dir) {
                Ok(b) => {
                    self.detector.mark(mtime, now);
                    b
                }
                Err(e) => {
                    // not recorded: the next tick retries
                    warn!("watcher: save failed: {:#}", e);
                    return None;
                }
            }
        };

        let saved = write_snapshot_at(&self.dir, SnapshotKind::Save, &bytes, &Local::now());
        cleanup_after_save(&self.dir, &self.policy);
        match saved {
            Ok(path) => {
                info!("Saved {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("watcher: save failed: {:#}", e);
                None
            }
        }
    }

    /// Run forever on a dedicated thread.
    pub fn spawn(mut self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("savekeeper-watcher".into())
            .spawn(move || {
                debug!(
                    "watcher: start, file={}, interval={}ms",
                    self.dir.active_path().display(),
                    self.interval.as_millis()
                );
                loop {
                    thread::sleep(self.interval);
                    self.tick();
                }
            })
    }
}
