use std::rc::Rc;

use super::collection::PersistentCollection;
use super::data::CatalogItem;
use super::store::{DurableStore, FAVORITES_KEY};
use crate::error::PersistenceError;

/// The user's favorited movies, keyed by identity, kept in insertion order
#[derive(Debug)]
pub struct FavoritesRegistry {
    items: PersistentCollection<Vec<CatalogItem>>,
}

impl FavoritesRegistry {
    pub fn new(store: Rc<dyn DurableStore>) -> Self {
        Self {
            items: PersistentCollection::new(store, FAVORITES_KEY),
        }
    }

    /// Add `item` unless its id is already present. Re-adding succeeds without a write.
    pub async fn add(&self, item: CatalogItem) -> Result<(), PersistenceError> {
        let id = item.id;
        let written = self
            .items
            .update(move |items| {
                if items.iter().any(|existing| existing.id == item.id) {
                    return false;
                }
                items.push(item);
                true
            })
            .await?;

        if written {
            tracing::debug!(id, "Favorite added");
        }
        Ok(())
    }

    /// Remove the item with `id`; absent ids are a successful no-op
    pub async fn remove(&self, id: i64) -> Result<(), PersistenceError> {
        let written = self
            .items
            .update(|items| {
                let before = items.len();
                items.retain(|existing| existing.id != id);
                items.len() != before
            })
            .await?;

        if written {
            tracing::debug!(id, "Favorite removed");
        }
        Ok(())
    }

    /// Flip membership of `item`. Returns whether it is a favorite afterwards.
    pub async fn toggle(&self, item: CatalogItem) -> Result<bool, PersistenceError> {
        let id = item.id;
        let mut now_favorite = false;
        self.items
            .update(|items| {
                if let Some(pos) = items.iter().position(|existing| existing.id == id) {
                    items.remove(pos);
                } else {
                    items.push(item);
                    now_favorite = true;
                }
                true
            })
            .await?;
        Ok(now_favorite)
    }

    pub async fn contains(&self, id: i64) -> bool {
        self.items.get().await.iter().any(|item| item.id == id)
    }

    /// Favorites in the order they were added
    pub async fn list(&self) -> Vec<CatalogItem> {
        self.items.get().await
    }

    pub async fn len(&self) -> usize {
        self.items.get().await.len()
    }
}
