use crate::watcher::ReadySink;
use crate::watcher::gate::SeenGate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tracing::{debug, info};

/// Admits settled files through the [`SeenGate`] and forwards them to the consumer.
///
/// This is the single notification sink shared by the debouncer and the sweep.
#[derive(Clone)]
pub struct ReadyHandler {
    gate: Arc<SeenGate>,
    ready_tx: Sender<PathBuf>,
}

impl ReadyHandler {
    pub fn new(gate: Arc<SeenGate>, ready_tx: Sender<PathBuf>) -> Self {
        Self { gate, ready_tx }
    }

    pub fn gate(&self) -> &Arc<SeenGate> {
        &self.gate
    }

    /// Admits `path` and sends it on. Returns whether it was admitted.
    pub fn handle_ready(&self, path: &Path) -> bool {
        if !self.gate.admit(path) {
            debug!(path = %path.display(), "ready file already seen or present at startup");
            return false;
        }

        info!(path = %path.display(), "file ready");
        if self.ready_tx.send(path.to_path_buf()).is_err() {
            debug!(path = %path.display(), "consumer gone, dropping ready file");
        }
        true
    }
}

impl ReadySink for ReadyHandler {
    fn notify_ready(&self, path: &Path) {
        self.handle_ready(path);
    }
}
