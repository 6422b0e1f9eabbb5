/// TMDB-compatible HTTP implementation of [`CatalogGateway`].
///
/// Browse pages come from one of the movie list feeds, searches from
/// `/search/movie`. Every request sends the `page` parameter and, when a
/// token is configured, a bearer `Authorization` header.
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::gateway::{CatalogGateway, CatalogPage, FetchMode};
use crate::error::NetworkError;
use crate::state::data::{clamp_rating, parse_release_date, CatalogItem};

pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Listing used for browse mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseFeed {
    #[default]
    Popular,
    TopRated,
    Upcoming,
}

impl BrowseFeed {
    pub fn path(self) -> &'static str {
        match self {
            Self::Popular => "/movie/popular",
            Self::TopRated => "/movie/top_rated",
            Self::Upcoming => "/movie/upcoming",
        }
    }
}

impl fmt::Display for BrowseFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Popular => "popular",
            Self::TopRated => "top-rated",
            Self::Upcoming => "upcoming",
        })
    }
}

impl FromStr for BrowseFeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "popular" => Ok(Self::Popular),
            "top-rated" => Ok(Self::TopRated),
            "upcoming" => Ok(Self::Upcoming),
            other => Err(format!("unknown feed '{}'", other)),
        }
    }
}

/// Configuration for the TMDB gateway.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// API root (e.g., `https://api.themoviedb.org/3`).
    pub base_url: String,
    /// Bearer token (TMDB "API Read Access Token").
    pub api_token: Option<String>,
    pub feed: BrowseFeed,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            feed: BrowseFeed::Popular,
            timeout_secs: 15,
        }
    }
}

/// Movie as returned by the list, search and details endpoints.
#[derive(Debug, Deserialize)]
struct MovieRecord {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    vote_average: Option<f32>,
    #[serde(default)]
    release_date: Option<String>,
}

impl From<MovieRecord> for CatalogItem {
    fn from(record: MovieRecord) -> Self {
        CatalogItem {
            id: record.id,
            title: record.title.unwrap_or_default(),
            synopsis: record.overview.unwrap_or_default(),
            poster_path: record.poster_path.filter(|p| !p.is_empty()),
            backdrop_path: record.backdrop_path.filter(|p| !p.is_empty()),
            rating: clamp_rating(record.vote_average.unwrap_or(0.0)),
            release_date: parse_release_date(record.release_date.as_deref()),
        }
    }
}

/// Paginated list envelope.
#[derive(Debug, Deserialize)]
struct MovieListResponse {
    page: u32,
    results: Vec<MovieRecord>,
    total_pages: u32,
    #[serde(default)]
    total_results: u64,
}

/// Error body TMDB sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    status_message: String,
}

/// Path and query parameters for fetching `page` in `mode`.
pub fn request_target(
    feed: BrowseFeed,
    mode: &FetchMode,
    page: u32,
) -> (&'static str, Vec<(&'static str, String)>) {
    let page = page.max(1).to_string();
    match mode {
        FetchMode::Browse => (feed.path(), vec![("page", page)]),
        FetchMode::Search(query) => (
            "/search/movie",
            vec![("query", query.clone()), ("page", page)],
        ),
    }
}

/// Decode a list envelope into a [`CatalogPage`].
pub fn parse_page(body: &str) -> Result<CatalogPage, NetworkError> {
    let response: MovieListResponse = decode(body)?;
    Ok(CatalogPage {
        items: response.results.into_iter().map(CatalogItem::from).collect(),
        page: response.page,
        total_pages: response.total_pages,
        total_results: response.total_results,
    })
}

/// Decode a single movie payload.
pub fn parse_item(body: &str) -> Result<CatalogItem, NetworkError> {
    decode::<MovieRecord>(body).map(CatalogItem::from)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, NetworkError> {
    serde_json::from_str(body).map_err(|e| NetworkError::Malformed(e.to_string()))
}

/// Gateway talking to a TMDB-compatible REST API.
pub struct TmdbGateway {
    client: reqwest::Client,
    config: TmdbConfig,
}

impl TmdbGateway {
    pub fn new(config: TmdbConfig) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, NetworkError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        tracing::debug!(url = %url, ?query, "Requesting catalog");

        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.status_message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::warn!(status = status.as_u16(), %message, "Catalog request rejected");
            return Err(NetworkError::Status {
                code: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

#[async_trait(?Send)]
impl CatalogGateway for TmdbGateway {
    async fn fetch(&self, mode: &FetchMode, page: u32) -> Result<CatalogPage, NetworkError> {
        let (path, query) = request_target(self.config.feed, mode, page);
        let body = self.get_text(path, &query).await?;
        let page = parse_page(&body)?;
        tracing::debug!(
            mode = %mode,
            page = page.page,
            total_pages = page.total_pages,
            items = page.items.len(),
            "Catalog page received"
        );
        Ok(page)
    }

    async fn details(&self, id: i64) -> Result<CatalogItem, NetworkError> {
        let body = self.get_text(&format!("/movie/{}", id), &[]).await?;
        parse_item(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LIST_BODY: &str = r#"{
        "page": 2,
        "results": [
            {
                "id": 603,
                "title": "The Matrix",
                "overview": "Neo wakes up.",
                "poster_path": "/matrix.jpg",
                "backdrop_path": null,
                "vote_average": 8.2,
                "release_date": "1999-03-31",
                "adult": false
            },
            {
                "id": 604,
                "title": "The Matrix Reloaded",
                "overview": "",
                "poster_path": null,
                "vote_average": 7.0,
                "release_date": ""
            }
        ],
        "total_pages": 5,
        "total_results": 97
    }"#;

    #[test]
    fn test_parse_list_page() {
        let page = parse_page(LIST_BODY).unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.total_results, 97);
        assert!(page.has_more());
        assert_eq!(page.items.len(), 2);

        let matrix = &page.items[0];
        assert_eq!(matrix.title, "The Matrix");
        assert_eq!(matrix.poster_path.as_deref(), Some("/matrix.jpg"));
        assert_eq!(matrix.backdrop_path, None);
        assert_eq!(matrix.release_date, NaiveDate::from_ymd_opt(1999, 3, 31));

        // Empty release date does not fail the page
        assert_eq!(page.items[1].release_date, None);
    }

    #[test]
    fn test_malformed_payload() {
        let err = parse_page(r#"{"page": 1}"#).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_PAYLOAD");
        assert!(parse_page("<html>").is_err());
    }

    #[test]
    fn test_parse_details() {
        let item = parse_item(r#"{"id": 11, "title": "Star Wars", "vote_average": 12.5}"#).unwrap();
        assert_eq!(item.id, 11);
        assert_eq!(item.rating, 10.0);
    }

    #[test]
    fn test_request_target_always_sends_page() {
        let (path, query) = request_target(BrowseFeed::Popular, &FetchMode::Browse, 3);
        assert_eq!(path, "/movie/popular");
        assert_eq!(query, vec![("page", "3".to_string())]);

        let (path, query) = request_target(
            BrowseFeed::TopRated,
            &FetchMode::Search("blade runner".to_string()),
            1,
        );
        assert_eq!(path, "/search/movie");
        assert_eq!(
            query,
            vec![("query", "blade runner".to_string()), ("page", "1".to_string())]
        );
    }

    #[test]
    fn test_feed_parsing() {
        assert_eq!("top_rated".parse::<BrowseFeed>(), Ok(BrowseFeed::TopRated));
        assert_eq!("Upcoming".parse::<BrowseFeed>(), Ok(BrowseFeed::Upcoming));
        assert!("trending".parse::<BrowseFeed>().is_err());
        assert_eq!(BrowseFeed::TopRated.path(), "/movie/top_rated");
    }
}
