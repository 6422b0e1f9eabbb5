/// Remote catalog module
///
/// This module handles:
/// - The gateway contract the pagination layer fetches through (gateway.rs)
/// - The TMDB HTTP implementation (tmdb.rs)
/// - Resolving artwork path fragments to image URLs (images.rs)

pub mod gateway;
pub mod images;
pub mod tmdb;

pub use gateway::{CatalogGateway, CatalogPage, FetchMode};
pub use images::{ImageResolver, ImageSize};
pub use tmdb::{BrowseFeed, TmdbConfig, TmdbGateway};
