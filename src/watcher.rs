//! Download-folder watching: detects files that have finished arriving and
//! surfaces each one at most once per session.
//!
//! Events flow from the notify adapter ([`watcher`]) into the per-path
//! [`debounce::Debouncer`], which probes stability off the event thread
//! ([`stability`]) and hands settled files to the [`handler::ReadyHandler`].
//! The handler admits them through the [`gate::SeenGate`]. The optional
//! [`sweep::Sweeper`] feeds the same handler on a timer. [`service`] wires it
//! all together.

pub mod debounce;
pub mod gate;
pub mod handler;
pub mod service;
pub mod stability;
pub mod suppress;
pub mod sweep;
pub mod watcher;

use std::path::{Path, PathBuf};

/// Normalized absolute form used as the identity of a watched path.
///
/// Normalization is lexical only: relative paths are joined onto the current
/// directory and `.` components dropped. Symlinks are not resolved and case
/// is preserved, so on a case-insensitive filesystem two spellings of one
/// file are distinct keys. Event paths come from a canonicalized watch root,
/// which keeps their spelling consistent in practice.
pub fn normalize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Receives paths that are ready to be acted on.
///
/// Called on the checking worker's thread with no debouncer lock held, so a
/// sink may query or feed the debouncer. A slow sink delays only its own
/// worker.
pub trait ReadySink: Send + Sync {
    fn notify_ready(&self, path: &Path);
}

impl<F> ReadySink for F
where
    F: Fn(&Path) + Send + Sync,
{
    fn notify_ready(&self, path: &Path) {
        self(path)
    }
}
