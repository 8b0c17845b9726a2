use crate::watcher::gate::SeenGate;
use crate::watcher::stability::is_temporary;
use crate::watcher::{ReadySink, suppress};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Periodic rescan that recovers files whose events were missed.
///
/// Only files modified after startup and untouched for longer than the sweep
/// age are considered; they go through the same gate and sink as the debouncer.
pub struct Sweeper {
    dir: PathBuf,
    age: Duration,
    gate: Arc<SeenGate>,
    sink: Arc<dyn ReadySink>,
}

impl Sweeper {
    pub fn new(dir: &Path, age: Duration, gate: Arc<SeenGate>, sink: Arc<dyn ReadySink>) -> Self {
        Sweeper {
            dir: dir.to_path_buf(),
            age,
            gate,
            sink,
        }
    }

    /// Sweeps every `interval` until `stop_rx` receives or its sender is dropped.
    pub fn run(&self, interval: Duration, stop_rx: Receiver<()>) {
        while let Err(RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
            self.sweep();
        }
        debug!(dir = %self.dir.display(), "sweep stopping");
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(SystemTime::now())
    }

    /// Runs one pass as if the current time were `now`.
    /// Returns how many files were raised as ready.
    pub fn sweep_at(&self, now: SystemTime) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "sweep could not read watch folder");
                return 0;
            }
        };

        let mut raised = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !entry.file_type().is_ok_and(|ft| ft.is_file()) {
                continue;
            }
            if is_temporary(&path) || suppress::is_lock_file(&path) {
                continue;
            }
            let Ok(mtime) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            if !self.old_enough(mtime, now) {
                continue;
            }
            if suppress::is_held(&self.dir) {
                debug!(dir = %self.dir.display(), "rename lock present, sweep skipping");
                break;
            }
            if self.gate.should_process(&path) {
                self.sink.notify_ready(&path);
                raised += 1;
            }
        }
        raised
    }

    fn old_enough(&self, mtime: SystemTime, now: SystemTime) -> bool {
        if self.gate.baseline().predates_start(mtime) {
            return false;
        }
        now.duration_since(mtime)
            .is_ok_and(|elapsed| elapsed > self.age)
    }
}
