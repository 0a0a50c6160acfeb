//! Configuration file watcher for route hot reload.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by renaming a temporary file would otherwise detach the watch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::RouterConfig;

/// Sends a validated [`RouterConfig`] every time the watched file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let reloader = Reloader {
            path: self.path.clone(),
            last: Mutex::new(std::fs::read_to_string(&self.path).ok()),
            tx: self.update_tx,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && touches(&event, file_name.as_ref());
                    if relevant {
                        reloader.reload();
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn touches(event: &Event, file_name: Option<&OsString>) -> bool {
    match file_name {
        Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name.as_os_str())),
        None => true,
    }
}

struct Reloader {
    path: PathBuf,
    /// Content of the last accepted version.
    last: Mutex<Option<String>>,
    tx: mpsc::UnboundedSender<RouterConfig>,
}

impl Reloader {
    fn reload(&self) {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Config file unreadable, keeping current routes");
                return;
            }
        };

        let mut last = self.last.lock().expect("watcher mutex poisoned");
        if last.as_deref() == Some(content.as_str()) {
            tracing::debug!(path = ?self.path, "Config content unchanged, reload skipped");
            return;
        }

        match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = ?self.path, routes = config.routes.len(), "Config reloaded");
                *last = Some(content);
                let _ = self.tx.send(config);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current routes");
            }
        }
    }
}
