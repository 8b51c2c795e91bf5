use thiserror::Error;

/// Main error type for friendgraph
#[derive(Error, Debug)]
pub enum CrawlError {
    /// Login or session failure against the friend-list service
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport failure talking to the friend-list service
    #[error("Network error: {0}")]
    Network(String),

    /// Friend-list payload could not be parsed into friend entries
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Persisted cache unreachable or holding a corrupt entry
    #[error("Cache error: {0}")]
    Cache(String),

    /// SQLite errors from the persisted cache backend
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors (fixtures, output sink)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CrawlError {
    /// True for failures of the persisted cache, which callers may degrade
    /// to a cache miss instead of aborting the run.
    pub fn is_cache(&self) -> bool {
        matches!(self, CrawlError::Cache(_) | CrawlError::Database(_))
    }
}

/// Convenient Result type using CrawlError
pub type Result<T> = std::result::Result<T, CrawlError>;
