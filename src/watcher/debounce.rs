use crate::watcher::stability::{StabilityWindow, is_temporary};
use crate::watcher::{ReadySink, normalize, suppress};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::{debug, warn};
use uuid::Uuid;

/// The one in-flight stability check for a path.
struct PendingCheck {
    episode: Uuid,
    // NOTE: a send, or the sender being dropped, cancels the worker
    cancel: mpsc::Sender<()>,
}

type Registry = Arc<Mutex<HashMap<PathBuf, PendingCheck>>>;

/// Schedules at most one stability check per path, cancelling and replacing
/// the previous one whenever a new event arrives for that path.
pub struct Debouncer {
    pending: Registry,
    window: StabilityWindow,
    sink: Arc<dyn ReadySink>,
    watch_dir: Option<PathBuf>,
}

impl Debouncer {
    pub fn new(window: StabilityWindow, sink: Arc<dyn ReadySink>) -> Self {
        Debouncer {
            pending: Arc::new(Mutex::new(HashMap::new())),
            window,
            sink,
            watch_dir: None,
        }
    }

    /// Restricts scheduling to direct children of `dir`.
    pub fn scoped_to(mut self, dir: &Path) -> Self {
        self.watch_dir = Some(normalize(dir));
        self
    }

    pub fn window(&self) -> StabilityWindow {
        self.window
    }

    /// Consumes event paths until every sender is dropped.
    pub fn run(&self, input_rx: Receiver<PathBuf>) {
        while let Ok(path) = input_rx.recv() {
            self.on_event(&path);
        }
        debug!("event channel closed, debouncer stopping");
    }

    /// Handles a create, modify, or move-into-folder event for `path`.
    ///
    /// Cancels any pending check for the path before dispatching a new one.
    /// Returns whether a check was scheduled.
    pub fn on_event(&self, path: &Path) -> bool {
        let path = normalize(path);
        if !self.qualifies(&path) {
            return false;
        }

        let (cancel_tx, cancel_rx) = mpsc::channel();
        let episode = Uuid::new_v4();

        {
            let mut pending = self.pending.lock();
            let check = PendingCheck {
                episode,
                cancel: cancel_tx,
            };
            if let Some(previous) = pending.insert(path.clone(), check) {
                let _ = previous.cancel.send(());
                debug!(path = %path.display(), episode = %previous.episode, "superseded pending check");
            }
        }

        let worker = Worker {
            path: path.clone(),
            episode,
            cancel_rx,
            window: self.window,
            sink: Arc::clone(&self.sink),
            pending: Arc::clone(&self.pending),
        };

        let spawned = thread::Builder::new()
            .name("sloan-settle".into())
            .spawn(move || worker.run());

        if let Err(e) = spawned {
            warn!(path = %path.display(), error = %e, "failed to spawn stability check");
            let mut pending = self.pending.lock();
            if pending.get(&path).is_some_and(|p| p.episode == episode) {
                pending.remove(&path);
            }
            return false;
        }

        true
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending.lock().contains_key(&normalize(path))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Cancels every in-flight check. Their workers finish sampling but deliver nothing.
    pub fn cancel_all(&self) {
        for (_, check) in self.pending.lock().drain() {
            let _ = check.cancel.send(());
        }
    }

    fn qualifies(&self, path: &Path) -> bool {
        if suppress::is_lock_file(path) || !path.is_file() {
            return false;
        }
        match &self.watch_dir {
            Some(dir) => path.parent() == Some(dir.as_path()),
            None => true,
        }
    }
}

struct Worker {
    path: PathBuf,
    episode: Uuid,
    cancel_rx: Receiver<()>,
    window: StabilityWindow,
    sink: Arc<dyn ReadySink>,
    pending: Registry,
}

impl Worker {
    fn run(self) {
        let settled = self.settle();

        // The delivery decision and removal happen under the registry lock so
        // a newer event cannot slip in between the cancellation check and
        // the entry removal. The sink itself runs after the lock is released.
        let deliver = {
            let mut pending = self.pending.lock();
            let deliver = if settled && !self.is_cancelled() {
                if suppress::is_suppressed(&self.path) {
                    debug!(path = %self.path.display(), "rename lock appeared during check");
                    false
                } else {
                    true
                }
            } else {
                if settled {
                    debug!(path = %self.path.display(), episode = %self.episode, "check cancelled");
                }
                false
            };

            if pending.get(&self.path).is_some_and(|p| p.episode == self.episode) {
                pending.remove(&self.path);
            }
            deliver
        };

        if deliver {
            self.sink.notify_ready(&self.path);
        }
    }

    fn settle(&self) -> bool {
        if suppress::is_suppressed(&self.path) {
            debug!(path = %self.path.display(), "rename lock present, skipping");
            return false;
        }
        if is_temporary(&self.path) {
            return false;
        }
        self.window.is_stable(&self.path)
    }

    fn is_cancelled(&self) -> bool {
        !matches!(self.cancel_rx.try_recv(), Err(TryRecvError::Empty))
    }
}
