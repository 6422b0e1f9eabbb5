/// Key-value durable store contract
///
/// Every persistent collection owns exactly one key in the store and keeps
/// its whole value serialized under it. There is no atomicity across keys.
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::PersistenceError;

/// Store key for the favorites collection
pub const FAVORITES_KEY: &str = "shelfex:favorites";
/// Store key for the theme preference
pub const THEME_KEY: &str = "shelfex:theme";
/// Store key for the search history
pub const SEARCH_HISTORY_KEY: &str = "shelfex:search_history";

/// Persistent string map. Operations may suspend but never block other tasks.
#[async_trait(?Send)]
pub trait DurableStore {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Overwrite the raw value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory store keyed by string, for ephemeral sessions and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value currently held under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }
}

#[async_trait(?Send)]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;

    /// Wraps a [`MemoryStore`] and fails reads or writes on demand
    #[derive(Debug, Clone, Default)]
    pub struct FlakyStore {
        pub inner: MemoryStore,
        fail_reads: Rc<Cell<bool>>,
        fail_writes: Rc<Cell<bool>>,
        writes: Rc<Cell<usize>>,
    }

    impl FlakyStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.set(fail);
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.set(fail);
        }

        /// Number of successful `set`/`remove` calls
        pub fn writes(&self) -> usize {
            self.writes.get()
        }
    }

    #[async_trait(?Send)]
    impl DurableStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            if self.fail_reads.get() {
                return Err(PersistenceError::Unavailable("read refused".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
            // Yield so concurrent writers actually interleave at this point
            tokio::task::yield_now().await;
            if self.fail_writes.get() {
                return Err(PersistenceError::Unavailable("write refused".to_string()));
            }
            self.writes.set(self.writes.get() + 1);
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
            if self.fail_writes.get() {
                return Err(PersistenceError::Unavailable("write refused".to_string()));
            }
            self.writes.set(self.writes.get() + 1);
            self.inner.remove(key).await
        }
    }
}
