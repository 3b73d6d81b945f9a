//! Rebuild on save by polling the program file's modification time.

use crate::commands::common::rebuild;
use forthwave_core::Runtime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

/// How often the file is checked.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Tracks one file's modification time.
pub struct FileWatcher {
    path: PathBuf,
    last: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last = modified(&path);
        Self { path, last }
    }

    /// Whether the file changed since the last call. A missing file is
    /// not a change; editors often replace files by delete and rename.
    pub fn changed(&mut self) -> bool {
        match modified(&self.path) {
            Some(now) if Some(now) != self.last => {
                self.last = Some(now);
                true
            }
            _ => false,
        }
    }
}

/// Poll `path` until `running` clears, rebuilding `runtime` on each change.
pub fn spawn(path: PathBuf, runtime: Arc<Runtime>, running: Arc<AtomicBool>) -> JoinHandle<()> {
    let mut watcher = FileWatcher::new(path.clone());
    std::thread::spawn(move || {
        tracing::info!(path = %path.display(), "watching for changes");
        while running.load(Ordering::Relaxed) {
            std::thread::sleep(POLL_INTERVAL);
            if !watcher.changed() {
                continue;
            }
            match rebuild(&runtime, &path) {
                Ok(report) => tracing::info!(
                    instructions = report.instructions,
                    definitions = report.definitions.len(),
                    "program reloaded"
                ),
                Err(err) => tracing::error!("reload failed, previous program keeps running: {err:#}"),
            }
        }
    })
}
