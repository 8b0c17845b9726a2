use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Marker file whose presence suppresses ready notifications for its directory.
pub const LOCK_FILE_NAME: &str = ".sloan_renaming";

pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE_NAME)
}

/// Returns true if `path` is the lock marker itself.
pub fn is_lock_file(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == LOCK_FILE_NAME)
}

/// Creates the lock marker in `dir`. Safe to call when it already exists.
pub fn acquire(dir: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(lock_path(dir))?;
    Ok(())
}

/// Removes the lock marker from `dir`. Safe to call when it is absent.
pub fn release(dir: &Path) -> io::Result<()> {
    match fs::remove_file(lock_path(dir)) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Returns true while the lock marker exists in `dir`.
pub fn is_held(dir: &Path) -> bool {
    lock_path(dir).exists()
}

/// Returns true while the lock marker exists in the directory containing `path`.
pub fn is_suppressed(path: &Path) -> bool {
    path.parent().is_some_and(is_held)
}

/// Holds the lock marker for a directory until dropped.
///
/// Released on every exit path, including early `?` returns and unwinding.
#[derive(Debug)]
pub struct RenameGuard {
    dir: PathBuf,
}

impl RenameGuard {
    pub fn acquire(dir: &Path) -> io::Result<Self> {
        acquire(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for RenameGuard {
    fn drop(&mut self) {
        if let Err(e) = release(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "failed to release rename lock");
        }
    }
}
