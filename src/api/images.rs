/// Image URL resolution
///
/// Items carry opaque path fragments ("/abc.jpg"); a fetchable URL is
/// `{base}/{size}{path}`. Missing fragments resolve to a placeholder.
use std::fmt;

use crate::state::data::CatalogItem;

pub const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/500x750";
pub const BACKDROP_PLACEHOLDER: &str = "https://via.placeholder.com/500x281";

/// Size tokens understood by the image CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W185,
    W342,
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn token(self) -> &'static str {
        match self {
            Self::W185 => "w185",
            Self::W342 => "w342",
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::Original => "original",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Join base URL, size token and path fragment, or fall back to `placeholder`
pub fn image_url(base: &str, size: ImageSize, path: Option<&str>, placeholder: &str) -> String {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => {
            let base = base.trim_end_matches('/');
            if path.starts_with('/') {
                format!("{}/{}{}", base, size.token(), path)
            } else {
                format!("{}/{}/{}", base, size.token(), path)
            }
        }
        None => placeholder.to_string(),
    }
}

/// Resolves item artwork against a configured CDN
#[derive(Debug, Clone)]
pub struct ImageResolver {
    base_url: String,
    poster_size: ImageSize,
    backdrop_size: ImageSize,
}

impl ImageResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            poster_size: ImageSize::W342,
            backdrop_size: ImageSize::W780,
        }
    }

    pub fn with_sizes(mut self, poster: ImageSize, backdrop: ImageSize) -> Self {
        self.poster_size = poster;
        self.backdrop_size = backdrop;
        self
    }

    pub fn poster(&self, item: &CatalogItem) -> String {
        image_url(
            &self.base_url,
            self.poster_size,
            item.poster_path.as_deref(),
            POSTER_PLACEHOLDER,
        )
    }

    pub fn backdrop(&self, item: &CatalogItem) -> String {
        image_url(
            &self.base_url,
            self.backdrop_size,
            item.backdrop_path.as_deref(),
            BACKDROP_PLACEHOLDER,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_base_size_and_path() {
        assert_eq!(
            image_url(
                "https://image.tmdb.org/t/p",
                ImageSize::W342,
                Some("/x.jpg"),
                POSTER_PLACEHOLDER
            ),
            "https://image.tmdb.org/t/p/w342/x.jpg"
        );
        // Trailing slash on the base is tolerated
        assert_eq!(
            image_url("https://cdn/", ImageSize::Original, Some("/y.jpg"), POSTER_PLACEHOLDER),
            "https://cdn/original/y.jpg"
        );
    }

    #[test]
    fn test_missing_path_uses_placeholder() {
        assert_eq!(
            image_url("https://cdn", ImageSize::W500, None, POSTER_PLACEHOLDER),
            POSTER_PLACEHOLDER
        );
        assert_eq!(
            image_url("https://cdn", ImageSize::W780, Some("  "), BACKDROP_PLACEHOLDER),
            BACKDROP_PLACEHOLDER
        );
    }

    #[test]
    fn test_resolver_uses_configured_sizes() {
        let mut item = CatalogItem::new(1, "A");
        item.poster_path = Some("/p.jpg".to_string());

        let resolver = ImageResolver::new("https://cdn");
        assert_eq!(resolver.poster(&item), "https://cdn/w342/p.jpg");
        assert_eq!(resolver.backdrop(&item), BACKDROP_PLACEHOLDER);

        let large = resolver.with_sizes(ImageSize::W500, ImageSize::Original);
        assert_eq!(large.poster(&item), "https://cdn/w500/p.jpg");
    }
}
