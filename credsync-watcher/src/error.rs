//! Typed errors for the file watcher.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    /// The directory that should contain the watched file does not exist.
    #[error("Parent directory of '{}' does not exist", path.display())]
    MissingParent { path: PathBuf },

    /// The path cannot name a single watchable file.
    #[error("Cannot watch '{}': {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },

    /// The notify backend failed to start or to register the watch.
    #[error("File watch failed: {0}")]
    Notify(#[from] notify::Error),

    /// An event handler returned an error; the watcher has stopped.
    #[error("Event handler failed: {0:#}")]
    Handler(anyhow::Error),
}
