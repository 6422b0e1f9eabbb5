/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the remote catalog, the durable store and the front end.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Upper bound of the rating scale used by the remote catalog
pub const MAX_RATING: f32 = 10.0;

/// Represents a single movie in the catalog
///
/// Identity is the remote `id`. Two items with the same id are the same item
/// even if their other fields diverge between fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable ID assigned by the remote service
    pub id: i64,
    pub title: String,
    pub synopsis: String,
    /// Opaque poster path fragment (e.g. "/abc.jpg"), resolved with a base URL and size
    pub poster_path: Option<String>,
    /// Opaque backdrop path fragment
    pub backdrop_path: Option<String>,
    /// Average rating in [0, 10]
    pub rating: f32,
    pub release_date: Option<NaiveDate>,
}

impl CatalogItem {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            synopsis: String::new(),
            poster_path: None,
            backdrop_path: None,
            rating: 0.0,
            release_date: None,
        }
    }

    /// Key for list diffing, derived from identity only
    pub fn list_key(&self) -> String {
        format!("movie-{}", self.id)
    }

    /// Rating formatted the way list cards show it ("7.3")
    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.rating)
    }

    /// Release year, when the date is known
    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }
}

impl PartialEq for CatalogItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CatalogItem {}

impl Hash for CatalogItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Clamp a remote rating into the [0, 10] scale. NaN maps to 0.
pub fn clamp_rating(raw: f32) -> f32 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, MAX_RATING)
    }
}

/// Parse an ISO calendar date ("2024-03-01"). Empty or malformed input maps to None.
pub fn parse_release_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
