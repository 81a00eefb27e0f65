use crate::error::StorageError;
use crate::owner::OwnerId;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored URL record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The short identifier, unique across the store.
    pub code: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
    /// Who shortened it. Anonymous when empty.
    pub owner: OwnerId,
    /// Soft-delete flag. Only ever moves from `false` to `true`.
    pub deleted: bool,
    /// Insertion ordinal assigned by the store.
    pub sequence: i64,
}

/// A mapping to insert through [`UrlStore::set_urls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrl {
    pub code: ShortCode,
    pub original_url: String,
}

/// What [`UrlStore::set_url`] did with the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetUrlOutcome {
    /// The code was free and the record was created.
    Created { sequence: i64 },
    /// The code was already bound to the same URL. Nothing was written.
    Conflict { sequence: i64 },
}

impl SetUrlOutcome {
    pub fn sequence(&self) -> i64 {
        match self {
            SetUrlOutcome::Created { sequence } | SetUrlOutcome::Conflict { sequence } => *sequence,
        }
    }
}

/// Aggregate counts over owned, non-deleted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    pub urls: u64,
    pub owners: u64,
}

/// A read-only view of a URL store.
#[async_trait]
pub trait ReadUrlStore: Send + Sync + 'static {
    /// Liveness probe for the backend.
    async fn ping(&self) -> Result<()>;

    /// Resolves a code to its URL.
    ///
    /// Returns `Err(NotFound)` for unknown codes and `Err(Deleted)` for
    /// soft-deleted ones.
    async fn get_url(&self, code: &ShortCode) -> Result<String>;

    /// Returns every non-deleted record owned by `owner`, oldest first.
    async fn get_urls(&self, owner: &OwnerId) -> Result<Vec<UrlRecord>>;

    async fn get_state(&self) -> Result<StoreState>;
}

#[async_trait]
pub trait UrlStore: ReadUrlStore {
    /// Binds `code` to `url` if the code is free.
    ///
    /// Returns `Conflict` when the code is already bound to the same URL and
    /// `Err(IdBusy)` when it is bound to a different one. The check and the
    /// insert happen atomically.
    async fn set_url(&self, code: &ShortCode, url: &str, owner: &OwnerId) -> Result<SetUrlOutcome>;

    /// Inserts a batch of mappings and returns the records actually created.
    ///
    /// Mappings whose code is already taken are left out of the result
    /// instead of failing the batch.
    async fn set_urls(&self, urls: Vec<NewUrl>, owner: &OwnerId) -> Result<Vec<UrlRecord>>;

    /// Soft-deletes the given codes that belong to `owner`.
    /// Unknown codes and codes of other owners are skipped.
    async fn delete_urls(&self, owner: &OwnerId, codes: &[ShortCode]) -> Result<()>;
}
