use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SloanError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Store(#[from] crate::organizer::StoreError),

    #[error(transparent)]
    Rename(#[from] crate::rename::RenameError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("watch folder does not exist: {0}")]
    WatchFolderMissing(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type SloanResult<T> = Result<T, SloanError>;
