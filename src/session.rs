/// A browsing session: one gateway, one accumulator, and shared handles to
/// the persisted collections.
///
/// Collections are opened once per process ([`Collections::open`]) and
/// handed to whichever component needs them.
use std::rc::Rc;

use crate::api::gateway::{CatalogGateway, FetchMode};
use crate::browse::{Completion, PaginationAccumulator, QueryCommand};
use crate::error::SessionError;
use crate::state::data::CatalogItem;
use crate::state::{DurableStore, FavoritesRegistry, SearchHistoryLedger, ThemeSettings};

/// The three durable collections, sharing one store
#[derive(Debug, Clone)]
pub struct Collections {
    pub favorites: Rc<FavoritesRegistry>,
    pub history: Rc<SearchHistoryLedger>,
    pub theme: Rc<ThemeSettings>,
}

impl Collections {
    pub fn open(store: Rc<dyn DurableStore>, history_limit: usize) -> Self {
        Self {
            favorites: Rc::new(FavoritesRegistry::new(store.clone())),
            history: Rc::new(SearchHistoryLedger::with_limit(store.clone(), history_limit)),
            theme: Rc::new(ThemeSettings::new(store)),
        }
    }
}

pub struct CatalogSession<G> {
    gateway: G,
    pagination: PaginationAccumulator,
    favorites: Rc<FavoritesRegistry>,
    history: Rc<SearchHistoryLedger>,
}

impl<G: CatalogGateway> CatalogSession<G> {
    pub fn new(gateway: G, collections: &Collections) -> Self {
        Self {
            gateway,
            pagination: PaginationAccumulator::new(),
            favorites: collections.favorites.clone(),
            history: collections.history.clone(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn pagination(&self) -> &PaginationAccumulator {
        &self.pagination
    }

    pub fn items(&self) -> &[CatalogItem] {
        self.pagination.items()
    }

    /// Reload page 1 of the browse feed
    pub async fn browse(&mut self) -> Completion {
        self.pagination.refresh(&self.gateway, FetchMode::Browse).await
    }

    /// Search for `query`; a blank query goes back to browse.
    ///
    /// A search that lands records the query in the history. Failing to
    /// record it does not fail the search.
    pub async fn search(&mut self, query: &str) -> Completion {
        if query.trim().is_empty() {
            return self.browse().await;
        }

        let completion = self
            .pagination
            .refresh(&self.gateway, FetchMode::Search(query.to_string()))
            .await;

        if completion == Completion::Applied {
            if let Err(err) = self.history.record(query).await {
                tracing::warn!(query, error = %err, "Could not record search history");
            }
        }
        completion
    }

    /// Route a debouncer command
    pub async fn apply(&mut self, command: QueryCommand) -> Completion {
        match command {
            QueryCommand::Search(query) => self.search(&query).await,
            QueryCommand::ResetToBrowse => self.browse().await,
        }
    }

    /// Append the next browse page, if one may be fetched now
    pub async fn load_more(&mut self) -> Option<Completion> {
        self.pagination.load_more(&self.gateway).await
    }

    /// Re-run the history entry at `index` immediately
    pub async fn run_history_entry(&mut self, index: usize) -> Option<Completion> {
        let query = self.history.list().await.into_iter().nth(index)?;
        Some(self.search(&query).await)
    }

    /// Find an item by id in the list, then the favorites, then remotely
    pub async fn lookup(&self, id: i64) -> Result<CatalogItem, SessionError> {
        if let Some(item) = self.pagination.items().iter().find(|i| i.id == id) {
            return Ok(item.clone());
        }
        if let Some(item) = self.favorites.list().await.into_iter().find(|i| i.id == id) {
            return Ok(item);
        }
        Ok(self.gateway.details(id).await?)
    }

    /// Flip favorite membership of `id`. Returns whether it is a favorite afterwards.
    pub async fn toggle_favorite(&self, id: i64) -> Result<bool, SessionError> {
        let item = self.lookup(id).await?;
        Ok(self.favorites.toggle(item).await?)
    }

    pub async fn is_favorite(&self, id: i64) -> bool {
        self.favorites.contains(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::accumulator::testing::{page, ScriptedGateway};
    use crate::error::NetworkError;
    use crate::state::store::testing::FlakyStore;
    use crate::state::MemoryStore;

    fn session(gateway: ScriptedGateway) -> (CatalogSession<ScriptedGateway>, Collections) {
        let collections = Collections::open(Rc::new(MemoryStore::new()), 10);
        (CatalogSession::new(gateway, &collections), collections)
    }

    #[tokio::test]
    async fn test_successful_search_is_recorded() {
        let gateway = ScriptedGateway::new();
        gateway.push(Ok(page(&[1], 1, 1)));
        let (mut session, collections) = session(gateway);

        assert_eq!(session.search("alien").await, Completion::Applied);
        assert_eq!(collections.history.list().await, vec!["alien"]);
    }

    #[tokio::test]
    async fn test_failed_search_is_not_recorded() {
        let gateway = ScriptedGateway::new();
        gateway.push(Err(NetworkError::Timeout));
        let (mut session, collections) = session(gateway);

        assert_eq!(session.search("alien").await, Completion::Failed);
        assert!(collections.history.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_write_failure_does_not_fail_search() {
        let store = FlakyStore::new();
        let collections = Collections::open(Rc::new(store.clone()), 10);
        let gateway = ScriptedGateway::new();
        gateway.push(Ok(page(&[4, 5], 1, 1)));
        let mut session = CatalogSession::new(gateway, &collections);

        store.fail_writes(true);
        assert_eq!(session.search("heat").await, Completion::Applied);
        assert_eq!(session.items().len(), 2);
    }

    #[tokio::test]
    async fn test_commands_route_to_modes() {
        let gateway = ScriptedGateway::new();
        gateway.push(Ok(page(&[7], 1, 1))).push(Ok(page(&[1, 2], 1, 5)));
        let (mut session, _collections) = session(gateway);

        session.apply(QueryCommand::Search("x".to_string())).await;
        assert_eq!(session.pagination().mode(), &FetchMode::Search("x".to_string()));

        session.apply(QueryCommand::ResetToBrowse).await;
        assert_eq!(session.pagination().mode(), &FetchMode::Browse);
        assert_eq!(session.items().len(), 2);
    }

    #[tokio::test]
    async fn test_history_entry_runs_immediately() {
        let gateway = ScriptedGateway::new();
        gateway.push(Ok(page(&[1], 1, 1))).push(Ok(page(&[2], 1, 1))).push(Ok(page(&[3], 1, 1)));
        let (mut session, collections) = session(gateway);
        session.search("first").await;
        session.search("second").await;

        // Index 1 is the older query
        assert_eq!(session.run_history_entry(1).await, Some(Completion::Applied));
        assert_eq!(collections.history.list().await, vec!["first", "second"]);
        assert_eq!(session.run_history_entry(5).await, None);
    }

    #[tokio::test]
    async fn test_toggle_favorite_prefers_listed_item() {
        let gateway = ScriptedGateway::new();
        gateway.push(Ok(page(&[1, 2], 1, 1)));
        let (mut session, collections) = session(gateway);
        session.browse().await;

        assert!(session.toggle_favorite(2).await.unwrap());
        assert_eq!(session.gateway().call_count(), 1);
        assert!(session.is_favorite(2).await);

        // Not in the list: fetched by id
        assert!(session.toggle_favorite(99).await.unwrap());
        assert_eq!(collections.favorites.list().await.len(), 2);

        assert!(!session.toggle_favorite(2).await.unwrap());
        assert!(!session.is_favorite(2).await);
    }
}
