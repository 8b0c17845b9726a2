use crate::watcher::suppress::RenameGuard;
use crate::watcher::normalize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Time left for the filesystem to deliver the rename's own events while the
/// lock is still held.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error(transparent)]
    FileError(#[from] std::io::Error),
}

/// Renames `path` to `new_name` within its directory while watcher
/// notifications for that directory are suppressed.
///
/// If the target exists, the first free `"{stem} ({n}){ext}"` with n ≥ 2 is
/// used. Returns the final path; the caller should mark it seen.
pub fn rename_file(path: &Path, new_name: &str) -> Result<PathBuf, RenameError> {
    rename_file_with_delay(path, new_name, SETTLE_DELAY)
}

pub fn rename_file_with_delay(
    path: &Path,
    new_name: &str,
    settle: Duration,
) -> Result<PathBuf, RenameError> {
    let new_name = valid_name(new_name)?;
    let dir = path
        .parent()
        .ok_or_else(|| RenameError::InvalidPath(path.to_path_buf()))?;

    let _guard = RenameGuard::acquire(dir)?;

    let target = dir.join(new_name);
    if normalize(&target) == normalize(path) {
        return Ok(path.to_path_buf());
    }

    let target = unique_target(&target);
    fs::rename(path, &target)?;
    info!(from = %path.display(), to = %target.display(), "renamed");

    thread::sleep(settle);
    Ok(target)
}

/// Returns `target` if free, otherwise `"{stem} ({n}){ext}"` for the first free n ≥ 2.
pub fn unique_target(target: &Path) -> PathBuf {
    if !target.exists() {
        return target.to_path_buf();
    }

    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (2..)
        .map(|i| target.with_file_name(format!("{stem} ({i}){ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| target.to_path_buf())
}

fn valid_name(name: &str) -> Result<&str, RenameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(RenameError::InvalidName(name.to_owned()));
    }
    if trimmed.contains(&['/', '\\'][..]) {
        return Err(RenameError::InvalidName(name.to_owned()));
    }
    Ok(trimmed)
}
