use thiserror::Error;

/// Failures talking to the remote catalog.
///
/// All variants are transient from the caller's point of view: retrying the
/// same refresh or load-more is always well defined.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl NetworkError {
    /// Machine-readable code for this error variant.
    pub fn code(&self) -> &str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Status { .. } => "HTTP_STATUS",
            Self::Malformed(_) => "MALFORMED_PAYLOAD",
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failures reading or writing the durable store.
///
/// When a mutation returns one of these, the in-memory collection was left
/// untouched.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a session-level action that touches both the network and the store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
