//! Client-side state core for a movie catalog browser.
//!
//! Pages through a remote catalog in browse or search mode, debounces typed
//! queries, and keeps favorites, search history and the theme preference in
//! a durable key-value store.

pub mod api;
pub mod browse;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

pub use error::{NetworkError, PersistenceError, SessionError};
pub use session::{CatalogSession, Collections};
