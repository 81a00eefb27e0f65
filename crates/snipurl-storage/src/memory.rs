use async_trait::async_trait;
use parking_lot::RwLock;
use snipurl_core::store::Result;
use snipurl_core::{
    Dumper, NewUrl, OwnerId, ReadUrlStore, SetUrlOutcome, ShortCode, StorageError, StoreState,
    UrlRecord, UrlStore,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

const EXPECTED_NUMBER_OF_URLS: usize = 1000;

#[derive(Debug, Default)]
struct Table {
    records: HashMap<ShortCode, UrlRecord>,
}

impl Table {
    /// Check-and-insert under the caller's write guard.
    fn set_url(&mut self, code: &ShortCode, url: &str, owner: &OwnerId) -> Result<SetUrlOutcome> {
        if let Some(existing) = self.records.get(code) {
            if existing.original_url != url {
                return Err(StorageError::IdBusy(code.to_string()));
            }
            return Ok(SetUrlOutcome::Conflict {
                sequence: existing.sequence,
            });
        }

        // Records are never removed, so the table size is a monotonic ordinal.
        let sequence = self.records.len() as i64 + 1;
        self.records.insert(
            code.clone(),
            UrlRecord {
                code: code.clone(),
                original_url: url.to_owned(),
                owner: owner.clone(),
                deleted: false,
                sequence,
            },
        );

        Ok(SetUrlOutcome::Created { sequence })
    }
}

/// In-memory implementation of [`UrlStore`].
///
/// One reader/writer lock guards the whole code → record table. Writers hold
/// it for the full check-then-insert sequence, so two callers racing on the
/// same code can never both create it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    table: RwLock<Table>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::with_capacity(EXPECTED_NUMBER_OF_URLS)
    }

    /// Creates a new in-memory store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RwLock::new(Table {
                records: HashMap::with_capacity(capacity),
            }),
        }
    }

    /// Number of records ever stored, deleted ones included.
    pub fn len(&self) -> usize {
        self.table.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replays a dump into the store and returns how many records were added.
    ///
    /// Repeated lines are skipped. A code that the dump binds to two
    /// different URLs means the dump is corrupt and aborts the restore.
    pub async fn restore<D: Dumper + ?Sized>(&self, dumper: &D) -> Result<usize> {
        let records = dumper
            .read_all()
            .await
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        let mut table = self.table.write();
        let mut restored = 0;
        for record in records {
            let code = ShortCode::new_unchecked(record.short_url);
            match table.set_url(&code, &record.original_url, &record.owner_id) {
                Ok(SetUrlOutcome::Created { .. }) => restored += 1,
                Ok(SetUrlOutcome::Conflict { .. }) => {
                    debug!(code = %code, "skipping duplicate dump record");
                }
                Err(StorageError::IdBusy(code)) => {
                    return Err(StorageError::InvalidData(format!(
                        "dump binds code '{code}' to more than one url"
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        info!(restored, "restored in-memory store from dump");
        Ok(restored)
    }
}

#[async_trait]
impl ReadUrlStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Err(StorageError::Unavailable(
            "in-memory store has no database connection".to_string(),
        ))
    }

    async fn get_url(&self, code: &ShortCode) -> Result<String> {
        let table = self.table.read();

        let Some(record) = table.records.get(code) else {
            return Err(StorageError::NotFound(code.to_string()));
        };

        if record.deleted {
            return Err(StorageError::Deleted(code.to_string()));
        }

        Ok(record.original_url.clone())
    }

    async fn get_urls(&self, owner: &OwnerId) -> Result<Vec<UrlRecord>> {
        let table = self.table.read();

        let mut records: Vec<UrlRecord> = table
            .records
            .values()
            .filter(|record| !record.deleted && &record.owner == owner)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.sequence);

        Ok(records)
    }

    async fn get_state(&self) -> Result<StoreState> {
        let table = self.table.read();

        let mut urls = 0;
        let mut owners = HashSet::new();
        for record in table.records.values() {
            if !record.deleted && !record.owner.is_anonymous() {
                urls += 1;
                owners.insert(record.owner.as_str());
            }
        }

        Ok(StoreState {
            urls,
            owners: owners.len() as u64,
        })
    }
}

#[async_trait]
impl UrlStore for InMemoryStore {
    async fn set_url(&self, code: &ShortCode, url: &str, owner: &OwnerId) -> Result<SetUrlOutcome> {
        self.table.write().set_url(code, url, owner)
    }

    async fn set_urls(&self, urls: Vec<NewUrl>, owner: &OwnerId) -> Result<Vec<UrlRecord>> {
        let mut table = self.table.write();
        let mut inserted = Vec::with_capacity(urls.len());

        for url in urls {
            match table.set_url(&url.code, &url.original_url, owner) {
                Ok(SetUrlOutcome::Created { sequence }) => inserted.push(UrlRecord {
                    code: url.code,
                    original_url: url.original_url,
                    owner: owner.clone(),
                    deleted: false,
                    sequence,
                }),
                Ok(SetUrlOutcome::Conflict { .. }) | Err(StorageError::IdBusy(_)) => {
                    debug!(code = %url.code, "code already taken, leaving it out of the batch");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(inserted)
    }

    async fn delete_urls(&self, owner: &OwnerId, codes: &[ShortCode]) -> Result<()> {
        let mut table = self.table.write();

        for code in codes {
            match table.records.get_mut(code) {
                Some(record) if &record.owner == owner => record.deleted = true,
                _ => continue,
            }
        }

        Ok(())
    }
}
