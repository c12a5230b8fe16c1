//! Per-URL cancellation registry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle returned when a request is registered.
///
/// The id ties the handle to its registry slot, so a request that completes
/// after being overwritten by a newer request for the same URL cannot remove
/// the newer entry.
#[derive(Debug, Clone)]
pub struct Registration {
    id: u64,
    url: String,
    token: CancellationToken,
}

impl Registration {
    /// Registry key of this request.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Signal observed by the transport.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

struct Entry {
    id: u64,
    token: CancellationToken,
}

/// Map from request URL to the cancellation handle of the latest in-flight
/// request for that URL.
///
/// At most one handle is live per URL. Registering a URL that is already
/// present replaces the entry without cancelling the earlier request.
#[derive(Default)]
pub struct CancellationRegistry {
    entries: Mutex<HashMap<String, Entry>>,
    next_id: AtomicU64,
}

impl CancellationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for `url` and store it, replacing any previous one.
    pub fn register(&self, url: &str) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let replaced = self.entries.lock().insert(
            url.to_string(),
            Entry {
                id,
                token: token.clone(),
            },
        );
        if replaced.is_some() {
            debug!(url, "Replaced in-flight cancellation handle");
        }
        Registration {
            id,
            url: url.to_string(),
            token,
        }
    }

    /// Remove the entry for a completed request.
    ///
    /// Returns `false` if the slot is empty or now belongs to a newer request.
    pub fn complete(&self, registration: &Registration) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(&registration.url) {
            Some(entry) if entry.id == registration.id => {
                entries.remove(&registration.url);
                true
            }
            _ => false,
        }
    }

    /// Cancel and remove the entry for `url`. Unknown URLs are ignored.
    pub fn cancel(&self, url: &str) -> bool {
        let removed = self.entries.lock().remove(url);
        match removed {
            Some(entry) => {
                entry.token.cancel();
                debug!(url, "Cancelled request");
                true
            }
            None => false,
        }
    }

    /// Cancel every registered request and clear the registry.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(String, Entry)> = self.entries.lock().drain().collect();
        for (_, entry) in &drained {
            entry.token.cancel();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "Cancelled all requests");
        }
        drained.len()
    }

    /// Whether `url` currently has a registered handle.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.lock().contains_key(url)
    }

    /// Registered URLs, sorted.
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.entries.lock().keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Number of registered handles.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for CancellationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationRegistry")
            .field("urls", &self.urls())
            .finish()
    }
}
