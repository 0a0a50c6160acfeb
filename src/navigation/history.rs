//! Session history contract and an in-memory implementation.
//!
//! # Responsibilities
//! - Push and replace history entries
//! - Report the current location and its state
//! - Publish back/forward (popstate) events to subscribers
//!
//! # Design Decisions
//! - Entries store absolute URLs; relative targets are joined against the
//!   current entry
//! - Popstate events are broadcast, so late subscribers only see new events

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use url::Url;

use crate::navigation::error::HostError;

/// State object stored with a history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    pub msg: String,
    /// Anything else carried by the entry.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryState {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            extra: Map::new(),
        }
    }

    /// A state that keeps everything `previous` carried, with a new message.
    pub fn derive(msg: impl Into<String>, previous: Option<&HistoryState>) -> Self {
        let mut state = previous.cloned().unwrap_or_default();
        state.msg = msg.into();
        state
    }
}

/// A back/forward navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct PopStateEvent {
    pub url: String,
    pub state: Option<HistoryState>,
}

/// Session history as seen by the navigation controller.
pub trait HistoryAdapter: Send + Sync {
    /// Add an entry after the current one and make it current.
    fn push_entry(&self, state: HistoryState, url: &str) -> Result<(), HostError>;

    /// Replace the current entry. Without a URL the location is kept.
    fn replace_entry(&self, state: HistoryState, url: Option<&str>) -> Result<(), HostError>;

    /// Absolute URL of the current entry.
    fn current_url(&self) -> String;

    fn current_state(&self) -> Option<HistoryState>;

    /// Full page load of `url`.
    fn assign(&self, url: &str) -> Result<(), HostError>;

    /// Receive popstate events.
    fn subscribe(&self) -> broadcast::Receiver<PopStateEvent>;
}

#[derive(Debug)]
struct Entry {
    url: Url,
    state: Option<HistoryState>,
}

#[derive(Debug)]
struct Inner {
    entries: Vec<Entry>,
    index: usize,
    assigned: Vec<String>,
}

impl Inner {
    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }

    fn join(&self, url: &str) -> Result<Url, HostError> {
        self.current()
            .url
            .join(url)
            .map_err(|e| HostError::new(format!("invalid history url `{}`: {}", url, e)))
    }
}

/// History kept in process memory.
///
/// Mirrors a browser session: pushing drops forward entries, and `back`,
/// `forward` and `go` emit popstate events.
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<Inner>,
    events: broadcast::Sender<PopStateEvent>,
}

impl MemoryHistory {
    /// Start a session at `initial_url`, which must be absolute.
    pub fn new(initial_url: &str) -> Result<Self, HostError> {
        let url = Url::parse(initial_url)
            .map_err(|e| HostError::new(format!("invalid initial url `{}`: {}", initial_url, e)))?;
        let (events, _) = broadcast::channel(64);
        Ok(Self {
            inner: Mutex::new(Inner {
                entries: vec![Entry { url, state: None }],
                index: 0,
                assigned: Vec::new(),
            }),
            events,
        })
    }

    /// Move `delta` entries through the session. Returns false when the
    /// target is out of range.
    pub fn go(&self, delta: isize) -> bool {
        let event = {
            let mut inner = self.inner.lock().expect("history mutex poisoned");
            let target = inner.index as isize + delta;
            if delta == 0 || target < 0 || target >= inner.entries.len() as isize {
                return false;
            }
            inner.index = target as usize;
            let entry = inner.current();
            PopStateEvent {
                url: entry.url.to_string(),
                state: entry.state.clone(),
            }
        };
        tracing::debug!(url = %event.url, delta, "History traversal");
        let _ = self.events.send(event);
        true
    }

    pub fn back(&self) -> bool {
        self.go(-1)
    }

    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Number of entries in the session.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("history mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// URLs of every entry, oldest first.
    pub fn urls(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("history mutex poisoned");
        inner.entries.iter().map(|e| e.url.to_string()).collect()
    }

    /// URLs passed to [`HistoryAdapter::assign`], in order.
    pub fn assignments(&self) -> Vec<String> {
        self.inner.lock().expect("history mutex poisoned").assigned.clone()
    }
}

impl HistoryAdapter for MemoryHistory {
    fn push_entry(&self, state: HistoryState, url: &str) -> Result<(), HostError> {
        let mut inner = self.inner.lock().expect("history mutex poisoned");
        let url = inner.join(url)?;
        let keep = inner.index + 1;
        inner.entries.truncate(keep);
        inner.entries.push(Entry {
            url,
            state: Some(state),
        });
        inner.index = keep;
        Ok(())
    }

    fn replace_entry(&self, state: HistoryState, url: Option<&str>) -> Result<(), HostError> {
        let mut inner = self.inner.lock().expect("history mutex poisoned");
        let url = match url {
            Some(url) => inner.join(url)?,
            None => inner.current().url.clone(),
        };
        let index = inner.index;
        inner.entries[index] = Entry {
            url,
            state: Some(state),
        };
        Ok(())
    }

    fn current_url(&self) -> String {
        self.inner.lock().expect("history mutex poisoned").current().url.to_string()
    }

    fn current_state(&self) -> Option<HistoryState> {
        self.inner.lock().expect("history mutex poisoned").current().state.clone()
    }

    fn assign(&self, url: &str) -> Result<(), HostError> {
        let mut inner = self.inner.lock().expect("history mutex poisoned");
        let resolved = inner.join(url)?;
        inner.assigned.push(url.to_string());
        tracing::info!(url = %resolved, "Full page load requested");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PopStateEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> MemoryHistory {
        MemoryHistory::new("https://app.test/start").unwrap()
    }

    #[test]
    fn test_push_resolves_relative_and_drops_forward() {
        let history = history();
        history.push_entry(HistoryState::new("a"), "/a").unwrap();
        history.push_entry(HistoryState::new("b"), "b").unwrap();
        assert_eq!(history.current_url(), "https://app.test/b");

        assert!(history.back());
        history.push_entry(HistoryState::new("c"), "/c?x=1").unwrap();
        assert_eq!(
            history.urls(),
            vec!["https://app.test/start", "https://app.test/a", "https://app.test/c?x=1"]
        );
        assert!(!history.forward());
    }

    #[test]
    fn test_replace_keeps_url_without_target() {
        let history = history();
        history.replace_entry(HistoryState::new("connect"), None).unwrap();
        assert_eq!(history.current_url(), "https://app.test/start");
        assert_eq!(history.current_state().unwrap().msg, "connect");
    }

    #[test]
    fn test_derive_keeps_extra_fields() {
        let mut previous = HistoryState::new("connect");
        previous.extra.insert("scroll".into(), Value::from(120));
        let state = HistoryState::derive("replaceRoute", Some(&previous));
        assert_eq!(state.msg, "replaceRoute");
        assert_eq!(state.extra["scroll"], 120);
    }

    #[tokio::test]
    async fn test_traversal_emits_popstate() {
        let history = history();
        let mut events = history.subscribe();
        history.push_entry(HistoryState::new("a"), "/a").unwrap();
        assert!(history.back());
        let event = events.recv().await.unwrap();
        assert_eq!(event.url, "https://app.test/start");
        assert!(event.state.is_none());
        assert!(!history.go(5));
    }

    #[test]
    fn test_assign_is_recorded() {
        let history = history();
        history.assign("/elsewhere").unwrap();
        assert_eq!(history.assignments(), vec!["/elsewhere"]);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_invalid_initial_url() {
        assert!(MemoryHistory::new("/relative").is_err());
    }
}
