use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::Sender,
};
use tracing::warn;

/// The event shapes the debouncer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(PathBuf),
    Modified(PathBuf),
    /// Rename into (or within) the folder. Some backends only report the destination.
    Moved { from: Option<PathBuf>, to: PathBuf },
}

impl FsEvent {
    /// The path a check should be scheduled for; the destination for moves.
    pub fn target(&self) -> &Path {
        match self {
            FsEvent::Created(path) | FsEvent::Modified(path) => path,
            FsEvent::Moved { to, .. } => to,
        }
    }
}

/// Maps a native notify event onto [`FsEvent`]s. Removals, access events and
/// the source half of a rename produce nothing.
pub fn translate(event: &Event) -> Vec<FsEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.iter().cloned().map(FsEvent::Created).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .iter()
            .cloned()
            .map(|to| FsEvent::Moved { from: None, to })
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to, ..] => vec![FsEvent::Moved {
                from: Some(from.clone()),
                to: to.clone(),
            }],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(_) => event.paths.iter().cloned().map(FsEvent::Modified).collect(),
        _ => Vec::new(),
    }
}

/// Starts a non-recursive watch on `watch_path`, forwarding target paths to `raw_event_tx`.
///
/// Dropping the returned watcher stops delivery and closes the sender.
pub fn setup_file_watcher(
    watch_path: &Path,
    raw_event_tx: Sender<PathBuf>,
) -> Result<RecommendedWatcher, notify::Error> {
    let event_handler = move |res: Result<Event, notify::Error>| match res {
        Ok(event) => {
            for fs_event in translate(&event) {
                let _ = raw_event_tx.send(fs_event.target().to_path_buf());
            }
        }
        Err(e) => warn!(error = %e, "file watcher error"),
    };

    let mut watcher = RecommendedWatcher::new(event_handler, Config::default())?;
    watcher.watch(watch_path, RecursiveMode::NonRecursive)?;

    Ok(watcher)
}
