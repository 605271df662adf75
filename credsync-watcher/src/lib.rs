//! Single-file change watcher.
//!
//! [`FileWatcher`] watches the parent directory of one file, filters events
//! down to that file and calls a [`FileEventHandler`]. The loop blocks on the
//! event channel and can be woken and stopped from another thread through a
//! [`StopHandle`].

pub mod error;
pub mod watcher;

pub use error::WatchError;
pub use watcher::{
    DEFAULT_DEBOUNCE, FileEventHandler, FileWatcher, StateHandle, StopHandle, StopReason,
    WatchState,
};
