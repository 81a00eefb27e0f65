use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("short code was deleted: {0}")]
    Deleted(String),
    #[error("short code is bound to another url: {0}")]
    IdBusy(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum SnipperError {
    #[error("failed to generate id")]
    FailedToGenerateId,
    #[error("failed to get url: {0}")]
    FailedToGetUrl(#[source] StorageError),
    #[error("url was deleted")]
    Deleted,
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SnipperError {
    /// True when a lookup failed because the code was never assigned.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FailedToGetUrl(source) if source.is_not_found())
    }
}

#[derive(Debug, Clone, Error)]
pub enum DumpError {
    #[error("dump file i/o failed: {0}")]
    Io(String),
    #[error("dump record serialization failed: {0}")]
    Serialization(String),
}
