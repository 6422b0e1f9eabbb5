/// Pagination accumulator
///
/// Tracks the active fetch mode, the page cursor and the accumulated item
/// list, and decides how each fetched page is merged. Every fetch is issued
/// against a [`FetchTicket`]; only the ticket most recently issued may
/// complete, so late responses for superseded requests are dropped.
use std::collections::HashMap;

use crate::api::gateway::{CatalogGateway, CatalogPage, FetchMode};
use crate::error::NetworkError;
use crate::state::data::CatalogItem;

/// Lifecycle of the most recent fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Position in the paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Last page applied to the list (1-based)
    pub current_page: u32,
    /// The remote reported pages past `current_page`
    pub has_more: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            current_page: 1,
            has_more: false,
        }
    }
}

/// How a fetched page joins the accumulated list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Replace the list wholesale (refresh, mode switch)
    Replace,
    /// Append after the current list (load more)
    Append,
}

/// Identifies one issued fetch: the mode and page it targets and how its
/// result will be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    mode: FetchMode,
    page: u32,
    merge: MergePolicy,
}

impl FetchTicket {
    pub fn mode(&self) -> &FetchMode {
        &self.mode
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn merge(&self) -> MergePolicy {
        self.merge
    }
}

/// Outcome of handing a fetch result back to the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The page was merged into the list
    Applied,
    /// The fetch failed; the list and cursor were kept
    Failed,
    /// The ticket was superseded; the result was discarded
    Stale,
}

#[derive(Debug)]
pub struct PaginationAccumulator {
    status: LoadStatus,
    mode: FetchMode,
    cursor: PageCursor,
    items: Vec<CatalogItem>,
    /// id -> position in `items`
    positions: HashMap<i64, usize>,
    last_error: Option<NetworkError>,
    /// A page of the current mode has been applied
    mode_loaded: bool,
    in_flight: Option<FetchTicket>,
    /// Merge policy of the fetch that put us in `Error`
    failed_merge: Option<MergePolicy>,
    next_seq: u64,
}

impl Default for PaginationAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationAccumulator {
    pub fn new() -> Self {
        Self {
            status: LoadStatus::Idle,
            mode: FetchMode::Browse,
            cursor: PageCursor::default(),
            items: Vec::new(),
            positions: HashMap::new(),
            last_error: None,
            mode_loaded: false,
            in_flight: None,
            failed_merge: None,
            next_seq: 0,
        }
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn mode(&self) -> &FetchMode {
        &self.mode
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// The accumulated list, in display order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Error from the last failed fetch, cleared when a new fetch starts
    pub fn last_error(&self) -> Option<&NetworkError> {
        self.last_error.as_ref()
    }

    /// The fetch currently awaited, if any
    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    // ========== Issuing fetches ==========

    /// Start fetching page 1 of `mode`, to replace the list.
    ///
    /// Valid from any state; an outstanding fetch is superseded and its
    /// result will be discarded.
    pub fn begin_refresh(&mut self, mode: FetchMode) -> FetchTicket {
        if mode != self.mode {
            tracing::debug!(from = %self.mode, to = %mode, "Switching fetch mode");
            self.mode = mode;
            self.mode_loaded = false;
        }
        if let Some(superseded) = &self.in_flight {
            tracing::debug!(
                page = superseded.page,
                mode = %superseded.mode,
                "Superseding in-flight fetch"
            );
        }
        self.issue(1, MergePolicy::Replace)
    }

    /// Same as [`begin_refresh`](Self::begin_refresh): switching never merges lists
    pub fn switch_mode(&mut self, mode: FetchMode) -> FetchTicket {
        self.begin_refresh(mode)
    }

    /// Start fetching the page after the cursor, to append to the list.
    ///
    /// Returns `None` (and changes nothing) while a fetch is in flight, when
    /// no more pages exist, in search mode, or before the current mode has
    /// loaded a page. After a failure only a failed load-more may be retried;
    /// a failed refresh has to be refreshed again.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.status == LoadStatus::Loading {
            tracing::debug!("Load more ignored: fetch already in flight");
            return None;
        }
        if !self.mode.is_browse() || !self.mode_loaded || !self.cursor.has_more {
            return None;
        }
        match self.status {
            LoadStatus::Loaded => {}
            LoadStatus::Error if self.failed_merge == Some(MergePolicy::Append) => {}
            _ => return None,
        }
        Some(self.issue(self.cursor.current_page + 1, MergePolicy::Append))
    }

    fn issue(&mut self, page: u32, merge: MergePolicy) -> FetchTicket {
        self.next_seq += 1;
        let ticket = FetchTicket {
            seq: self.next_seq,
            mode: self.mode.clone(),
            page,
            merge,
        };
        self.status = LoadStatus::Loading;
        self.last_error = None;
        self.failed_merge = None;
        self.in_flight = Some(ticket.clone());
        ticket
    }

    // ========== Completing fetches ==========

    /// Hand back the result of the fetch issued for `ticket`
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<CatalogPage, NetworkError>,
    ) -> Completion {
        match &self.in_flight {
            Some(current) if current.seq == ticket.seq => {}
            _ => {
                tracing::debug!(
                    page = ticket.page,
                    mode = %ticket.mode,
                    "Discarding stale response"
                );
                return Completion::Stale;
            }
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let has_more = page.has_more();
                let received = page.items.len();
                match ticket.merge() {
                    MergePolicy::Replace => self.replace_items(page.items),
                    MergePolicy::Append => self.append_items(page.items),
                }
                self.cursor = PageCursor {
                    current_page: ticket.page,
                    has_more,
                };
                self.mode_loaded = true;
                self.status = LoadStatus::Loaded;
                tracing::debug!(
                    page = ticket.page,
                    received,
                    total = self.items.len(),
                    has_more,
                    "Page merged"
                );
                Completion::Applied
            }
            Err(err) => {
                tracing::warn!(
                    page = ticket.page,
                    mode = %ticket.mode,
                    error = %err,
                    "Catalog fetch failed"
                );
                self.status = LoadStatus::Error;
                self.failed_merge = Some(ticket.merge());
                self.last_error = Some(err);
                Completion::Failed
            }
        }
    }

    fn replace_items(&mut self, items: Vec<CatalogItem>) {
        self.items.clear();
        self.positions.clear();
        self.append_items(items);
    }

    /// Append by identity: a known id is updated in place, a new id is pushed
    fn append_items(&mut self, items: Vec<CatalogItem>) {
        for item in items {
            match self.positions.get(&item.id) {
                Some(&pos) => self.items[pos] = item,
                None => {
                    self.positions.insert(item.id, self.items.len());
                    self.items.push(item);
                }
            }
        }
    }

    // ========== Drivers ==========

    /// Refresh `mode` from page 1 through `gateway`
    pub async fn refresh<G>(&mut self, gateway: &G, mode: FetchMode) -> Completion
    where
        G: CatalogGateway + ?Sized,
    {
        let ticket = self.begin_refresh(mode);
        let result = gateway.fetch(&ticket.mode, ticket.page).await;
        self.complete(&ticket, result)
    }

    /// Fetch and append the next page. `None` when load-more is not allowed now.
    pub async fn load_more<G>(&mut self, gateway: &G) -> Option<Completion>
    where
        G: CatalogGateway + ?Sized,
    {
        let ticket = self.begin_load_more()?;
        let result = gateway.fetch(&ticket.mode, ticket.page).await;
        Some(self.complete(&ticket, result))
    }
}
