use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::tmdb::{BrowseFeed, TmdbConfig, DEFAULT_API_BASE_URL};
use crate::browse::DEFAULT_QUIET_INTERVAL;
use crate::state::history::DEFAULT_HISTORY_LIMIT;
use crate::state::theme::ColorScheme;
use crate::state::SqliteStore;

pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

#[derive(Parser, Debug)]
#[command(
    name = "shelfex",
    version,
    about = "Browse, search and favorite movies from a TMDB-compatible catalog"
)]
pub struct CliArgs {
    /// Catalog API root
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "SHELFEX_API_BASE_URL")]
    pub api_base_url: String,

    /// Image CDN root used to resolve poster and backdrop paths
    #[arg(long, default_value = DEFAULT_IMAGE_BASE_URL, env = "SHELFEX_IMAGE_BASE_URL")]
    pub image_base_url: String,

    /// Bearer token for the catalog API
    #[arg(long, env = "SHELFEX_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Feed listed in browse mode: popular, top-rated, upcoming
    #[arg(long, default_value = "popular", env = "SHELFEX_FEED")]
    pub feed: BrowseFeed,

    /// Preference database path (defaults to the user data directory)
    #[arg(long, env = "SHELFEX_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Keep preferences in memory only
    #[arg(long)]
    pub memory_store: bool,

    /// Quiet interval before a typed query is searched, in milliseconds
    #[arg(long, default_value_t = DEFAULT_QUIET_INTERVAL.as_millis() as u64)]
    pub debounce_ms: u64,

    /// Number of search queries remembered
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub history_limit: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "15", env = "SHELFEX_TIMEOUT")]
    pub timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SHELFEX_LOG_LEVEL")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the browse feed
    Browse {
        /// Number of pages to accumulate
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Search the catalog and record the query in the history
    Search { query: String },
    /// Show one movie
    Details { id: i64 },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Manage search history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Show or change the display theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
        /// Host color scheme used to resolve the "system" theme
        #[arg(long, default_value = "light", global = true)]
        system: ColorScheme,
    },
    /// Read queries from stdin, one line per keystroke-level change
    Interactive,
}

#[derive(Subcommand, Debug)]
pub enum FavoritesAction {
    List,
    Add { id: i64 },
    Remove { id: i64 },
    Toggle { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    List,
    Remove { query: String },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ThemeAction {
    Show,
    Toggle,
}

/// Resolved settings for a catalog session
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub tmdb: TmdbConfig,
    pub image_base_url: String,
    /// `None` keeps preferences in memory
    pub db_path: Option<PathBuf>,
    pub debounce: Duration,
    pub history_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tmdb: TmdbConfig::default(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            db_path: SqliteStore::default_path(),
            debounce: DEFAULT_QUIET_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl From<&CliArgs> for CatalogConfig {
    fn from(args: &CliArgs) -> Self {
        let db_path = if args.memory_store {
            None
        } else {
            args.db_path.clone().or_else(SqliteStore::default_path)
        };

        Self {
            tmdb: TmdbConfig {
                base_url: args.api_base_url.clone(),
                api_token: args.api_token.clone().filter(|t| !t.trim().is_empty()),
                feed: args.feed,
                timeout_secs: args.timeout_secs,
            },
            image_base_url: args.image_base_url.clone(),
            db_path,
            debounce: Duration::from_millis(args.debounce_ms),
            history_limit: args.history_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_cli() {
        let args = CliArgs::try_parse_from(["shelfex", "--memory-store", "browse"]).unwrap();
        let config = CatalogConfig::from(&args);

        assert_eq!(config.db_path, None);
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.tmdb.feed, BrowseFeed::Popular);
        assert!(matches!(args.command, Command::Browse { pages: 1 }));
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "shelfex",
            "--feed",
            "top-rated",
            "--db-path",
            "/tmp/prefs.db",
            "--debounce-ms",
            "150",
            "--api-token",
            "   ",
            "search",
            "blade runner",
        ])
        .unwrap();
        let config = CatalogConfig::from(&args);

        assert_eq!(config.tmdb.feed, BrowseFeed::TopRated);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/prefs.db")));
        assert_eq!(config.debounce, Duration::from_millis(150));
        // Blank tokens are treated as absent
        assert_eq!(config.tmdb.api_token, None);
        assert!(matches!(args.command, Command::Search { ref query } if query == "blade runner"));
    }

    #[test]
    fn test_theme_system_flag() {
        let args =
            CliArgs::try_parse_from(["shelfex", "theme", "toggle", "--system", "dark"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Theme { action: ThemeAction::Toggle, system: ColorScheme::Dark }
        ));
    }
}
