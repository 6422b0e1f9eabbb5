use std::rc::Rc;

use super::collection::PersistentCollection;
use super::store::{DurableStore, SEARCH_HISTORY_KEY};
use crate::error::PersistenceError;

/// Number of queries kept by default
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Most-recently-used list of search queries, newest first, without duplicates
#[derive(Debug)]
pub struct SearchHistoryLedger {
    entries: PersistentCollection<Vec<String>>,
    limit: usize,
}

impl SearchHistoryLedger {
    pub fn new(store: Rc<dyn DurableStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Rc<dyn DurableStore>, limit: usize) -> Self {
        Self {
            entries: PersistentCollection::new(store, SEARCH_HISTORY_KEY),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Promote `query` to the front, evicting the oldest entry past the limit.
    ///
    /// Blank input is ignored. Returns whether the history changed.
    pub async fn record(&self, query: &str) -> Result<bool, PersistenceError> {
        if query.trim().is_empty() {
            return Ok(false);
        }

        let limit = self.limit;
        self.entries
            .update(|entries| {
                if entries.first().map(String::as_str) == Some(query) {
                    return false;
                }
                entries.retain(|existing| existing != query);
                entries.insert(0, query.to_string());
                entries.truncate(limit);
                true
            })
            .await
    }

    /// Drop `query` from the history. Returns whether it was present.
    pub async fn remove(&self, query: &str) -> Result<bool, PersistenceError> {
        self.entries
            .update(|entries| {
                let before = entries.len();
                entries.retain(|existing| existing != query);
                entries.len() != before
            })
            .await
    }

    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.entries.clear().await
    }

    /// Queries, most recent first
    pub async fn list(&self) -> Vec<String> {
        let mut entries = self.entries.get().await;
        // A store written with a larger limit is shown trimmed
        entries.truncate(self.limit);
        entries
    }
}
