/// State management module
///
/// This module handles all durable application state, including:
/// - The key-value store contract and its backends (store.rs, sqlite.rs)
/// - Shared data structures (data.rs)
/// - The generic persisted collection (collection.rs)
/// - Favorites, search history and theme preference built on it

pub mod collection;
pub mod data;
pub mod favorites;
pub mod history;
pub mod sqlite;
pub mod store;
pub mod theme;

pub use collection::PersistentCollection;
pub use data::CatalogItem;
pub use favorites::FavoritesRegistry;
pub use history::SearchHistoryLedger;
pub use sqlite::SqliteStore;
pub use store::{DurableStore, MemoryStore};
pub use theme::{ColorScheme, ThemePreference, ThemeSettings};
