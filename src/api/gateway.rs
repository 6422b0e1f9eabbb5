use async_trait::async_trait;
use std::fmt;

use crate::error::NetworkError;
use crate::state::data::CatalogItem;

/// Which listing the accumulator is paging through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMode {
    /// Page-based listing of the default feed
    Browse,
    /// Free-text search
    Search(String),
}

impl FetchMode {
    pub fn is_browse(&self) -> bool {
        matches!(self, Self::Browse)
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browse => f.write_str("browse"),
            Self::Search(query) => write!(f, "search \"{}\"", query),
        }
    }
}

/// One page of results returned by the remote catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

impl CatalogPage {
    /// More pages exist past this one
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Remote paginated catalog
#[async_trait(?Send)]
pub trait CatalogGateway {
    /// Fetch `page` (1-based) of the listing selected by `mode`
    async fn fetch(&self, mode: &FetchMode, page: u32) -> Result<CatalogPage, NetworkError>;

    /// Fetch a single item by id
    async fn details(&self, id: i64) -> Result<CatalogItem, NetworkError>;
}
