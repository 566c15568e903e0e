/// Shared error type used across all EduSync crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("store: {0}")]
    Store(String),

    /// A query needs an index that the data store does not have.
    #[error("missing index on {collection}.{field}")]
    MissingIndex { collection: String, field: String },

    #[error("cache: {0}")]
    Cache(String),

    #[error("config: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures the caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Timeout(_) | Error::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
