//! Process-wide registry of collection initialization status.
//!
//! Entries are created on first reference and live for the lifetime of the tracker.
//! Each entry has its own lock, so updates for one name never wait on another.
//! Every successful `set_status` publishes exactly one snapshot on a broadcast channel;
//! the snapshot is sent while the entry lock is held, so subscribers observe per-name
//! updates in the order they were applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::broadcast;

use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::{CollectionState, CollectionStatus};

const NOTIFICATION_CAPACITY: usize = 256;

type Entry = Arc<Mutex<CollectionStatus>>;

pub struct InitializationStatusTracker {
    entries: RwLock<HashMap<String, Entry>>,
    notifier: broadcast::Sender<CollectionStatus>,
}

impl InitializationStatusTracker {
    pub fn new() -> Self {
        let (notifier, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            notifier,
        }
    }

    /// Current status for `name`, creating a `NotStarted` entry if none exists
    pub fn get_status(&self, name: &str) -> CollectionStatus {
        let entry = self.entry(name);
        let status = entry.lock().unwrap_or_else(PoisonError::into_inner);
        status.clone()
    }

    /// Apply a state transition and notify subscribers.
    ///
    /// `NotStarted` is only a creation default: asking for it is rejected without touching
    /// the entry or sending a notification.
    pub fn set_status(
        &self,
        name: &str,
        state: CollectionState,
        error_message: Option<String>,
    ) -> VectorSearchResult<CollectionStatus> {
        if state == CollectionState::NotStarted {
            return Err(VectorSearchError::InvalidStatusTransition {
                name: name.to_string(),
                state,
            });
        }

        let entry = self.entry(name);
        let mut status = entry.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();

        status.state = state;
        match state {
            CollectionState::InProgress => {
                status.started_at = Some(now);
            }
            CollectionState::Completed => {
                status.completed_at = Some(now);
                status.error_message = None;
            }
            CollectionState::Failed => {
                status.completed_at = Some(now);
                status.error_message = error_message;
            }
            // rejected above
            CollectionState::NotStarted => {}
        }

        let snapshot = status.clone();
        tracing::debug!(collection = %name, state = ?snapshot.state, "Collection status changed");
        // No receivers is not an error: observers are optional.
        let _ = self.notifier.send(snapshot.clone());

        Ok(snapshot)
    }

    /// Receive a snapshot after every status change
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionStatus> {
        self.notifier.subscribe()
    }

    /// Every known status, sorted by name
    pub fn all(&self) -> Vec<CollectionStatus> {
        let entries: Vec<Entry> = {
            let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            map.values().cloned().collect()
        };

        let mut statuses: Vec<CollectionStatus> = entries
            .iter()
            .map(|entry| entry.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Current status for `name` without registering it; unseen names read as `NotStarted`
    pub fn peek(&self, name: &str) -> CollectionStatus {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        match entry {
            Some(entry) => entry.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            None => CollectionStatus::new(name),
        }
    }

    /// Status of each named collection, in the order given
    pub fn statuses_for<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Vec<CollectionStatus> {
        names.into_iter().map(|name| self.get_status(name)).collect()
    }

    /// True when every named collection has completed. An empty set is never ready.
    pub fn ready_for<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        let statuses = self.statuses_for(names);
        !statuses.is_empty()
            && statuses
                .iter()
                .all(|status| status.state == CollectionState::Completed)
    }

    fn entry(&self, name: &str) -> Entry {
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(entry);
        }

        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            map.entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(CollectionStatus::new(name)))),
        )
    }
}

impl Default for InitializationStatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
