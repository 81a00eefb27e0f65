use crate::delete::{DeleteService, DeleteTask};
use async_trait::async_trait;
use snipurl_core::{
    BatchInput, BatchOutput, DumpRecord, Dumper, NewUrl, NoopDumper, OwnerId, SetUrlOutcome,
    ShortCode, ShortenedUrl, Snipped, Snipper, SnipperError, StorageError, StoreState, UrlStore,
};
use snipurl_hasher::CodeHasher;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

type Result<T> = std::result::Result<T, SnipperError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct SnipperSettings {
    /// Hash attempts per URL before giving up on a free code.
    #[builder(default = 10)]
    pub max_attempts: usize,
    /// Codes per queued delete batch.
    #[builder(default = 10)]
    pub delete_batch_size: usize,
    #[builder(default = 10)]
    pub delete_workers: usize,
}

impl Default for SnipperSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The [`Snipper`] implementation.
///
/// Codes are derived from the URL by the hasher. When a code is already bound
/// to another URL, the colliding code is appended to the hashed content and
/// the hash is retried, up to `max_attempts` times.
pub struct SnipperService<S, H, D = NoopDumper> {
    store: Arc<S>,
    hasher: Arc<H>,
    dumper: Arc<D>,
    deleter: DeleteService,
    settings: SnipperSettings,
}

impl<S: UrlStore, H: CodeHasher> SnipperService<S, H, NoopDumper> {
    /// Creates a service that does not dump created records.
    ///
    /// Must be called inside a tokio runtime, which hosts the delete workers.
    pub fn new(store: S, hasher: H, settings: SnipperSettings) -> Self {
        Self::with_dumper(store, hasher, NoopDumper, settings)
    }
}

impl<S: UrlStore, H: CodeHasher, D: Dumper> SnipperService<S, H, D> {
    pub fn with_dumper(store: S, hasher: H, dumper: D, settings: SnipperSettings) -> Self {
        let store = Arc::new(store);
        let deleter = DeleteService::new(Arc::clone(&store), settings.delete_workers);

        Self {
            store,
            hasher: Arc::new(hasher),
            dumper: Arc::new(dumper),
            deleter,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Waits for queued deletions to be applied and stops the delete workers.
    pub async fn shutdown(&self) {
        self.deleter.shutdown().await;
    }

    async fn dump(&self, sequence: i64, code: &ShortCode, url: &str, owner: &OwnerId) {
        let record = DumpRecord {
            uuid: sequence,
            short_url: code.to_string(),
            original_url: url.to_owned(),
            owner_id: owner.clone(),
        };

        if let Err(e) = self.dumper.add(&record).await {
            warn!(code = %code, error = %e, "failed to dump record");
        }
    }
}

#[async_trait]
impl<S: UrlStore, H: CodeHasher, D: Dumper> Snipper for SnipperService<S, H, D> {
    async fn set_url(&self, url: &str, owner: &OwnerId) -> Result<Snipped> {
        let mut content = url.to_owned();

        for attempt in 1..=self.settings.max_attempts {
            let code = self.hasher.hash(&content);

            match self.store.set_url(&code, url, owner).await {
                Ok(SetUrlOutcome::Created { sequence }) => {
                    self.dump(sequence, &code, url, owner).await;
                    return Ok(Snipped::Created(code));
                }
                Ok(SetUrlOutcome::Conflict { .. }) => return Ok(Snipped::Existing(code)),
                Err(StorageError::IdBusy(_)) => {
                    debug!(attempt, code = %code, "code is bound to another url, salting");
                    content.push_str(code.as_str());
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(url, attempts = self.settings.max_attempts, "no free code found");
        Err(SnipperError::FailedToGenerateId)
    }

    async fn get_url(&self, code: &ShortCode) -> Result<String> {
        self.store.get_url(code).await.map_err(|e| match e {
            StorageError::Deleted(_) => SnipperError::Deleted,
            other => SnipperError::FailedToGetUrl(other),
        })
    }

    async fn set_urls(
        &self,
        inputs: Vec<BatchInput>,
        owner: &OwnerId,
    ) -> Result<HashMap<String, BatchOutput>> {
        if inputs.is_empty() {
            return Ok(HashMap::new());
        }

        let mut outputs = HashMap::with_capacity(inputs.len());
        let mut urls = Vec::with_capacity(inputs.len());
        for input in inputs {
            let code = self.hasher.hash(&input.original_url);
            urls.push(NewUrl {
                code: code.clone(),
                original_url: input.original_url,
            });
            outputs.insert(
                input.correlation_id.clone(),
                BatchOutput {
                    correlation_id: input.correlation_id,
                    code,
                },
            );
        }

        let submitted = urls.len();
        let inserted = self.store.set_urls(urls, owner).await?;
        for record in &inserted {
            self.dump(record.sequence, &record.code, &record.original_url, owner)
                .await;
        }

        if inserted.len() != submitted {
            warn!(
                submitted,
                inserted = inserted.len(),
                "batch left some urls without a code"
            );
            return Err(SnipperError::FailedToGenerateId);
        }

        Ok(outputs)
    }

    async fn get_urls(&self, owner: &OwnerId) -> Result<Vec<ShortenedUrl>> {
        let records = self.store.get_urls(owner).await?;

        Ok(records
            .into_iter()
            .map(|record| ShortenedUrl {
                code: record.code,
                original_url: record.original_url,
            })
            .collect())
    }

    async fn delete_urls(&self, owner: Option<&OwnerId>, codes: Vec<ShortCode>) {
        let Some(owner) = owner else {
            debug!(codes = codes.len(), "delete without owner ignored");
            return;
        };

        for batch in codes.chunks(self.settings.delete_batch_size.max(1)) {
            let task = DeleteTask {
                owner: owner.clone(),
                codes: batch.to_vec(),
            };
            if let Err(e) = self.deleter.submit(task).await {
                warn!(owner = %owner, error = %e, "dropping delete batch");
                return;
            }
        }
    }

    async fn get_state(&self) -> Result<StoreState> {
        Ok(self.store.get_state().await?)
    }

    async fn ping(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }
}
