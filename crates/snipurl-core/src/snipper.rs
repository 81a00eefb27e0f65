use crate::owner::OwnerId;
use crate::shortcode::ShortCode;
use crate::store::StoreState;
use async_trait::async_trait;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, crate::error::SnipperError>;

/// Outcome of shortening a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snipped {
    /// A new mapping was stored under this code.
    Created(ShortCode),
    /// The URL was already shortened to this code.
    Existing(ShortCode),
}

impl Snipped {
    pub fn code(&self) -> &ShortCode {
        match self {
            Snipped::Created(code) | Snipped::Existing(code) => code,
        }
    }

    pub fn into_code(self) -> ShortCode {
        match self {
            Snipped::Created(code) | Snipped::Existing(code) => code,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, Snipped::Existing(_))
    }
}

/// One item of a batch shorten request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    pub correlation_id: String,
    pub original_url: String,
}

/// One item of a batch shorten response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    pub correlation_id: String,
    pub code: ShortCode,
}

/// A code and the URL it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenedUrl {
    pub code: ShortCode,
    pub original_url: String,
}

#[async_trait]
pub trait Snipper: Send + Sync + 'static {
    /// Shortens `url` on behalf of `owner`.
    async fn set_url(&self, url: &str, owner: &OwnerId) -> Result<Snipped>;

    /// Resolves a code to the original URL.
    async fn get_url(&self, code: &ShortCode) -> Result<String>;

    /// Shortens every input or none of them, keyed by correlation id.
    async fn set_urls(
        &self,
        inputs: Vec<BatchInput>,
        owner: &OwnerId,
    ) -> Result<HashMap<String, BatchOutput>>;

    /// Lists the live URLs shortened by `owner`.
    async fn get_urls(&self, owner: &OwnerId) -> Result<Vec<ShortenedUrl>>;

    /// Schedules soft deletion of `codes` owned by `owner`.
    ///
    /// Returns once every batch is queued, not when it is applied.
    /// Without an owner nothing is scheduled.
    async fn delete_urls(&self, owner: Option<&OwnerId>, codes: Vec<ShortCode>);

    async fn get_state(&self) -> Result<StoreState>;

    async fn ping(&self) -> Result<()>;
}
