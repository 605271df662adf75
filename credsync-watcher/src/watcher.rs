//! Watch a single file through a watch on its parent directory.
//!
//! A directory watch is used because most backends cannot watch a file that
//! does not exist yet. Events for sibling files are dropped, and the events a
//! single write produces (create, modify, close) are settled over a short
//! window into one callback.

use notify::event::{ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::{Duration, Instant};

use crate::error::WatchError;

/// Default settle window for coalescing the events of one write.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Callbacks for changes to the watched file.
///
/// `on_create` and `on_update` may fail; an error stops the watcher. Deletion
/// is a notification only.
pub trait FileEventHandler {
    fn on_create(&mut self, path: &Path) -> anyhow::Result<()> {
        self.on_update(path)
    }

    fn on_update(&mut self, path: &Path) -> anyhow::Result<()>;

    fn on_delete(&mut self, path: &Path) {
        log::info!("{} was deleted", path.display());
    }
}

/// Lifecycle of a [`FileWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Initializing,
    Watching,
    HandlingEvent,
    Stopped,
}

/// Why [`FileWatcher::run`] returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// [`StopHandle::stop`] was called.
    Requested,
    /// The watched directory went away, or the backend stopped delivering
    /// events.
    WatchInvalidated,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Requested => "stop requested",
            StopReason::WatchInvalidated => "watched directory is gone",
        };
        f.write_str(text)
    }
}

enum WatchMessage {
    Fs(notify::Result<Event>),
    Stop,
}

/// Stops a running watcher from another thread, waking it immediately.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    tx: Sender<WatchMessage>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // The watcher may already be gone; nothing left to wake then.
        let _ = self.tx.send(WatchMessage::Stop);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Read-only view of a watcher's current state.
#[derive(Debug, Clone)]
pub struct StateHandle(Arc<Mutex<WatchState>>);

impl StateHandle {
    pub fn current(&self) -> WatchState {
        *self.0.lock()
    }
}

impl fmt::Debug for WatchMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchMessage::Fs(r) => f.debug_tuple("Fs").field(r).finish(),
            WatchMessage::Stop => f.write_str("Stop"),
        }
    }
}

/// What happened to the watched file during one settle window.
#[derive(Debug, Default, Clone, Copy)]
struct Pending {
    created: bool,
    modified: bool,
    removed: bool,
}

impl Pending {
    fn is_empty(&self) -> bool {
        !(self.created || self.modified || self.removed)
    }
}

enum Settled {
    Ready(Pending),
    Interrupted(StopReason),
}

/// Watches one file and feeds its changes to a [`FileEventHandler`].
pub struct FileWatcher {
    /// Watched file, under the canonical parent directory
    file: PathBuf,
    directory: PathBuf,
    /// The notify backend (kept alive to maintain watching)
    _watcher: Box<dyn Watcher + Send>,
    rx: Receiver<WatchMessage>,
    tx: Sender<WatchMessage>,
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<WatchState>>,
    debounce: Duration,
}

impl fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWatcher")
            .field("file", &self.file)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Watch `path` with the default settle window.
    pub fn new(path: &Path) -> Result<Self, WatchError> {
        Self::with_debounce(path, DEFAULT_DEBOUNCE)
    }

    /// Watch `path`. The file itself need not exist, but its parent
    /// directory must.
    ///
    /// Uses the platform's native backend, falling back to a `PollWatcher`
    /// when that cannot start (containers, network filesystems).
    pub fn with_debounce(path: &Path, debounce: Duration) -> Result<Self, WatchError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| WatchError::InvalidPath {
                path: path.to_path_buf(),
                reason: "path has no file name",
            })?
            .to_os_string();

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(WatchError::MissingParent {
                path: parent.to_path_buf(),
            });
        }
        let directory = parent
            .canonicalize()
            .map_err(|_| WatchError::MissingParent {
                path: parent.to_path_buf(),
            })?;
        let file = directory.join(file_name);

        let (tx, rx) = channel::<WatchMessage>();
        let mut watcher = Self::create_watcher(tx.clone())?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        log::debug!(
            "Registered watch on {} for {}",
            directory.display(),
            file.display()
        );

        Ok(Self {
            file,
            directory,
            _watcher: watcher,
            rx,
            tx,
            stop: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(WatchState::Initializing)),
            debounce,
        })
    }

    fn create_watcher(tx: Sender<WatchMessage>) -> Result<Box<dyn Watcher + Send>, WatchError> {
        let fallback_tx = tx.clone();
        let forward = move |res: notify::Result<Event>| {
            let _ = tx.send(WatchMessage::Fs(res));
        };

        match notify::recommended_watcher(forward) {
            Ok(w) => {
                log::debug!("File watcher: using native (RecommendedWatcher) backend");
                Ok(Box::new(w))
            }
            Err(e) => {
                log::warn!(
                    "File watcher: native backend unavailable ({}); falling back to PollWatcher",
                    e
                );
                let poll_watcher = PollWatcher::new(
                    move |res: notify::Result<Event>| {
                        let _ = fallback_tx.send(WatchMessage::Fs(res));
                    },
                    NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
                )?;
                Ok(Box::new(poll_watcher))
            }
        }
    }

    /// The watched file, resolved against the canonical parent directory.
    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
            tx: self.tx.clone(),
        }
    }

    pub fn state_handle(&self) -> StateHandle {
        StateHandle(Arc::clone(&self.state))
    }

    fn set_state(&self, state: WatchState) {
        *self.state.lock() = state;
    }

    fn finish(&self, reason: StopReason) -> Result<StopReason, WatchError> {
        self.set_state(WatchState::Stopped);
        log::info!("Stopped watching {}: {}", self.file.display(), reason);
        Ok(reason)
    }

    /// Block on filesystem events until stopped.
    ///
    /// Returns the stop reason, or [`WatchError::Handler`] when a callback
    /// failed. Either way the watcher ends in [`WatchState::Stopped`].
    pub fn run<H: FileEventHandler>(self, handler: &mut H) -> Result<StopReason, WatchError> {
        self.set_state(WatchState::Watching);
        log::info!("Watching {}", self.file.display());

        loop {
            if self.stop.load(Ordering::SeqCst) {
                return self.finish(StopReason::Requested);
            }

            let event = match self.rx.recv() {
                Ok(WatchMessage::Fs(Ok(event))) => event,
                Ok(WatchMessage::Fs(Err(e))) => {
                    log::warn!("File watch error on {}: {}", self.directory.display(), e);
                    continue;
                }
                Ok(WatchMessage::Stop) => return self.finish(StopReason::Requested),
                Err(_) => return self.finish(StopReason::WatchInvalidated),
            };

            if self.invalidates(&event) {
                return self.finish(StopReason::WatchInvalidated);
            }

            let mut pending = Pending::default();
            self.record(&event, &mut pending);
            if pending.is_empty() {
                continue;
            }

            let pending = match self.settle(pending) {
                Settled::Ready(p) => p,
                Settled::Interrupted(reason) => return self.finish(reason),
            };

            if let Err(e) = self.dispatch(pending, handler) {
                self.set_state(WatchState::Stopped);
                log::error!("Stopped watching {}: {:#}", self.file.display(), e);
                return Err(WatchError::Handler(e));
            }
        }
    }

    /// Keep collecting events for the watched file until the window closes.
    fn settle(&self, mut pending: Pending) -> Settled {
        let deadline = Instant::now() + self.debounce;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Settled::Ready(pending);
            }

            match self.rx.recv_timeout(remaining) {
                Ok(WatchMessage::Fs(Ok(event))) => {
                    if self.invalidates(&event) {
                        return Settled::Interrupted(StopReason::WatchInvalidated);
                    }
                    self.record(&event, &mut pending);
                }
                Ok(WatchMessage::Fs(Err(e))) => {
                    log::warn!("File watch error on {}: {}", self.directory.display(), e);
                }
                Ok(WatchMessage::Stop) => return Settled::Interrupted(StopReason::Requested),
                Err(RecvTimeoutError::Timeout) => return Settled::Ready(pending),
                Err(RecvTimeoutError::Disconnected) => {
                    return Settled::Interrupted(StopReason::WatchInvalidated);
                }
            }
        }
    }

    fn dispatch<H: FileEventHandler>(
        &self,
        pending: Pending,
        handler: &mut H,
    ) -> anyhow::Result<()> {
        let exists = self.file.exists();

        self.set_state(WatchState::HandlingEvent);
        let result = if exists && (pending.created || pending.removed) {
            log::info!("Created: {}", self.file.display());
            handler.on_create(&self.file)
        } else if exists {
            log::info!("Modified: {}", self.file.display());
            handler.on_update(&self.file)
        } else if pending.removed {
            log::info!("Deleted: {}", self.file.display());
            handler.on_delete(&self.file);
            Ok(())
        } else {
            log::debug!("{} changed but is gone again; ignoring", self.file.display());
            Ok(())
        };

        if result.is_ok() {
            self.set_state(WatchState::Watching);
        }
        result
    }

    fn is_watched(&self, path: &Path) -> bool {
        if path.is_relative() {
            self.directory.join(path) == self.file
        } else {
            path == self.file
        }
    }

    /// The directory itself was removed or renamed away.
    fn invalidates(&self, event: &Event) -> bool {
        let touches_directory = event.paths.iter().any(|p| p == &self.directory);
        let removal = matches!(
            event.kind,
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
        );
        removal && (touches_directory || !self.directory.is_dir())
    }

    /// Fold one event into `pending` if it concerns the watched file.
    fn record(&self, event: &Event, pending: &mut Pending) {
        if event.need_rescan() {
            log::warn!(
                "Event queue overflow while watching {}; skipping",
                self.directory.display()
            );
            return;
        }

        let first = event.paths.first().is_some_and(|p| self.is_watched(p));
        let any = event.paths.iter().any(|p| self.is_watched(p));

        match event.kind {
            EventKind::Create(_) if any => pending.created = true,
            EventKind::Remove(_) if any => pending.removed = true,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) if any => {
                pending.removed = true;
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) if any => {
                pending.created = true;
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if first {
                    pending.removed = true;
                }
                if event.paths.get(1).is_some_and(|p| self.is_watched(p)) {
                    pending.created = true;
                }
            }
            EventKind::Modify(_) if any => pending.modified = true,
            _ => return,
        }

        log::trace!("{:?} on {}", event.kind, self.file.display());
    }
}
