/// Typed collection persisted under a single durable-store key
///
/// Reads go through an in-memory cache that is filled on first access.
/// Writes go to the store first; the cache only changes once the store
/// accepted the new value, so memory is never ahead of disk.
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::Mutex;

use super::store::DurableStore;
use crate::error::PersistenceError;

pub struct PersistentCollection<T> {
    key: String,
    store: Rc<dyn DurableStore>,
    cache: RefCell<Option<T>>,
    /// Serializes read-modify-write cycles across suspension points
    gate: Mutex<()>,
}

impl<T> PersistentCollection<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub fn new(store: Rc<dyn DurableStore>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            store,
            cache: RefCell::new(None),
            gate: Mutex::new(()),
        }
    }

    /// True once a value is held in memory
    pub fn is_loaded(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Load the value from the store.
    ///
    /// Never fails: an unreadable store yields the default without caching it
    /// (the next access retries), an unparsable value yields the default and
    /// caches it.
    pub async fn load(&self) -> T {
        match self.load_checked().await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    key = %self.key,
                    error = %err,
                    "Failed to read collection, using default"
                );
                T::default()
            }
        }
    }

    /// Cached value, loading it on first access
    pub async fn get(&self) -> T {
        let cached = self.cache.borrow().clone();
        match cached {
            Some(value) => value,
            None => self.load().await,
        }
    }

    /// Overwrite the whole collection
    pub async fn save(&self, value: T) -> Result<(), PersistenceError> {
        let _guard = self.gate.lock().await;
        self.persist(value).await
    }

    /// Read-modify-write under the write gate.
    ///
    /// `mutate` returns whether it changed the value; an unchanged value is
    /// not written. Returns whether a write happened. If the current value
    /// cannot be read from the store, nothing is mutated.
    pub async fn update<F>(&self, mutate: F) -> Result<bool, PersistenceError>
    where
        F: FnOnce(&mut T) -> bool,
    {
        let _guard = self.gate.lock().await;

        let cached = self.cache.borrow().clone();
        let mut next = match cached {
            Some(value) => value,
            None => self.load_checked().await?,
        };

        if !mutate(&mut next) {
            return Ok(false);
        }

        self.persist(next).await?;
        Ok(true)
    }

    /// Remove the key from the store and reset to the default value
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        let _guard = self.gate.lock().await;

        if let Err(err) = self.store.remove(&self.key).await {
            tracing::warn!(key = %self.key, error = %err, "Failed to clear collection");
            return Err(err);
        }
        *self.cache.borrow_mut() = Some(T::default());
        Ok(())
    }

    async fn load_checked(&self) -> Result<T, PersistenceError> {
        let loaded = match self.store.get(&self.key).await? {
            None => T::default(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(key = %self.key, error = %err, "Discarding unparsable collection");
                T::default()
            }),
        };

        // A write may have committed while the read was suspended; it wins
        let mut cache = self.cache.borrow_mut();
        if let Some(current) = cache.as_ref() {
            return Ok(current.clone());
        }
        *cache = Some(loaded.clone());
        Ok(loaded)
    }

    async fn persist(&self, value: T) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(&value)?;
        if let Err(err) = self.store.set(&self.key, &raw).await {
            tracing::warn!(key = %self.key, error = %err, "Failed to persist collection");
            return Err(err);
        }
        *self.cache.borrow_mut() = Some(value);
        Ok(())
    }
}

impl<T> std::fmt::Debug for PersistentCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCollection")
            .field("key", &self.key)
            .field("loaded", &self.cache.borrow().is_some())
            .finish()
    }
}
