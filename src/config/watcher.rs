use crate::config::load::load_config_from_path;
use crate::config::types::{AppConfig, ConfigError};
use log::warn;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::time::{Duration, Instant};

/// Quiet period required after the last modify event before reloading, so
/// editors that write a file several times in a row trigger one reload.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Reloads the watched configuration file when it changes on disk.
pub struct ConfigWatcher {
    rx: Receiver<Result<Event, notify::Error>>,
    _watcher: RecommendedWatcher, // keeps the backend watching
    path: PathBuf,
    pending_since: Option<Instant>,
}

impl ConfigWatcher {
    pub fn watch(path: impl Into<PathBuf>) -> Result<Self, notify::Error> {
        let path = path.into();
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        Ok(Self {
            rx,
            _watcher: watcher,
            path,
            pending_since: None,
        })
    }

    /// Drain pending filesystem events; once the file has been quiet for the
    /// debounce window, reload it. Returns `None` while nothing changed —
    /// a reload noted during the debounce window is picked up by a later
    /// poll rather than blocking this one.
    pub fn poll(&mut self) -> Option<Result<AppConfig, ConfigError>> {
        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) if matches!(event.kind, EventKind::Modify(_)) => {
                    self.pending_since = Some(Instant::now());
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("config watcher error: {e}"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("config watcher channel disconnected");
                    return None;
                }
            }
        }

        if self.pending_since?.elapsed() < DEBOUNCE {
            return None;
        }
        self.pending_since = None;
        Some(load_config_from_path(&self.path))
    }
}
