/// Browsing module
///
/// This module turns user input into catalog fetches:
/// - Debouncing search input into commands (debounce.rs)
/// - Paging through browse/search results (accumulator.rs)

pub mod accumulator;
pub mod debounce;

pub use accumulator::{Completion, FetchTicket, LoadStatus, PageCursor, PaginationAccumulator};
pub use debounce::{QueryCommand, QueryDebouncer, DEFAULT_QUIET_INTERVAL};
