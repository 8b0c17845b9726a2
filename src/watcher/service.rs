use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    sync::mpsc::{Receiver, Sender, channel},
    thread::{self, JoinHandle},
};

use notify::RecommendedWatcher;
use tracing::{debug, info};

use crate::{
    config::WatchSettings,
    error::{SloanError, SloanResult},
    watcher::{
        debounce::Debouncer, gate::Baseline, gate::SeenGate, handler::ReadyHandler,
        stability::StabilityWindow, sweep::Sweeper, watcher::setup_file_watcher,
    },
};

/// Owns one folder watch: the notify watcher, the debouncer loop, the
/// optional sweep timer and the session's seen/baseline state.
pub struct WatcherService {
    settings: WatchSettings,
    watch_path: PathBuf,
    window: StabilityWindow,
    gate: Arc<SeenGate>,
    watcher: Option<RecommendedWatcher>,
    debouncer: Option<Arc<Debouncer>>,
    debouncer_thread: Option<JoinHandle<()>>,
    sweep_thread: Option<JoinHandle<()>>,
    sweep_stop_tx: Option<Sender<()>>,
}

impl WatcherService {
    /// Validates the settings and snapshots the folder's current files.
    ///
    /// # Errors
    /// - [`SloanError::WatchFolderMissing`] if `watch_folder` is not an existing directory
    /// - [`SloanError::InvalidConfig`] if `quiet_seconds` is negative or not finite
    pub fn create(watch_folder: &Path, settings: &WatchSettings) -> SloanResult<Self> {
        if !watch_folder.is_dir() {
            return Err(SloanError::WatchFolderMissing(watch_folder.to_path_buf()));
        }
        let quiet = settings.quiet().ok_or_else(|| {
            SloanError::InvalidConfig(format!(
                "watch.quiet_seconds must be a non-negative number, got {}",
                settings.quiet_seconds
            ))
        })?;

        // Notify reports resolved paths (e.g. /private/var on macOS).
        let watch_path = fs::canonicalize(watch_folder)?;
        let baseline = Baseline::capture(&watch_path)?;
        debug!(
            dir = %watch_path.display(),
            files = baseline.len(),
            "captured startup baseline"
        );

        let gate = Arc::new(SeenGate::new(baseline, settings.process_existing_on_start));

        Ok(WatcherService {
            settings: settings.clone(),
            watch_path,
            window: StabilityWindow::for_quiet(quiet),
            gate,
            watcher: None,
            debouncer: None,
            debouncer_thread: None,
            sweep_thread: None,
            sweep_stop_tx: None,
        })
    }

    /// Overrides the sampling window derived from `quiet_seconds`.
    pub fn with_window(mut self, window: StabilityWindow) -> Self {
        self.window = window;
        self
    }

    pub fn watch_path(&self) -> &Path {
        &self.watch_path
    }

    /// The session gate; consumers mark renamed files seen through it.
    pub fn gate(&self) -> Arc<SeenGate> {
        Arc::clone(&self.gate)
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Starts watching and returns the channel on which admitted paths arrive.
    pub fn run(&mut self) -> SloanResult<Receiver<PathBuf>> {
        if self.is_running() {
            return Err(SloanError::Other("watcher service already running".into()));
        }

        let (raw_tx, raw_rx) = channel::<PathBuf>();
        let (ready_tx, ready_rx) = channel::<PathBuf>();

        let handler = Arc::new(ReadyHandler::new(Arc::clone(&self.gate), ready_tx));
        let watcher = setup_file_watcher(&self.watch_path, raw_tx)?;

        let debouncer =
            Arc::new(Debouncer::new(self.window, handler.clone()).scoped_to(&self.watch_path));
        let loop_debouncer = Arc::clone(&debouncer);
        let debouncer_thread = thread::Builder::new()
            .name("sloan-debounce".into())
            .spawn(move || loop_debouncer.run(raw_rx))?;

        if self.settings.sweep_enabled {
            let (stop_tx, stop_rx) = channel::<()>();
            let sweeper = Sweeper::new(
                &self.watch_path,
                self.settings.sweep_age(),
                Arc::clone(&self.gate),
                handler,
            );
            let interval = self.settings.sweep_interval();
            let sweep_thread = thread::Builder::new()
                .name("sloan-sweep".into())
                .spawn(move || sweeper.run(interval, stop_rx))?;

            self.sweep_stop_tx = Some(stop_tx);
            self.sweep_thread = Some(sweep_thread);
        }

        info!(dir = %self.watch_path.display(), "watching");

        self.watcher = Some(watcher);
        self.debouncer = Some(debouncer);
        self.debouncer_thread = Some(debouncer_thread);

        Ok(ready_rx)
    }

    pub fn shutdown(&mut self) -> SloanResult<()> {
        // NOTE: dropping the watcher drops the raw sender, ending the debouncer loop
        self.watcher.take();
        if let Some(debouncer) = self.debouncer.take() {
            debouncer.cancel_all();
        }
        self.sweep_stop_tx.take();

        if let Some(handle) = self.debouncer_thread.take() {
            let _ = handle.join();
        }

        if let Some(handle) = self.sweep_thread.take() {
            let _ = handle.join();
        }

        Ok(())
    }
}

impl Drop for WatcherService {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
