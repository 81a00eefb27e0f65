use async_trait::async_trait;
use snipurl_core::store::Result;
use snipurl_core::{
    NewUrl, OwnerId, ReadUrlStore, SetUrlOutcome, ShortCode, StorageError, StoreState, UrlRecord,
    UrlStore,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Connection, Postgres, QueryBuilder, Row};
use std::time::Duration;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/postgres/urls.sql");

/// Rows per multi-row `INSERT`, well below the bind parameter limit.
const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresConfig {
    #[builder(setter(into))]
    pub dsn: String,
    #[builder(default = 10)]
    pub max_connections: u32,
    #[builder(default = Duration::from_secs(5))]
    pub acquire_timeout: Duration,
}

/// PostgreSQL implementation of [`UrlStore`].
///
/// Deletion only flips the `deleted` column, so a code is never handed out
/// twice. Conflict detection relies on the primary key of `short_code`
/// rather than a read-then-write, which keeps `set_url` atomic across
/// concurrent callers and processes.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a new connection pool.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.dsn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `urls` table and its indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        info!("postgres schema is up to date");
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn owned_record(row: &PgRow, owner: &OwnerId) -> Result<UrlRecord> {
    Ok(UrlRecord {
        code: ShortCode::new_unchecked(row.try_get::<String, _>("short_code").map_err(map_sqlx_error)?),
        original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
        owner: owner.clone(),
        deleted: false,
        sequence: row.try_get("seq").map_err(map_sqlx_error)?,
    })
}

#[async_trait]
impl ReadUrlStore for PostgresStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        conn.ping().await.map_err(map_sqlx_error)
    }

    async fn get_url(&self, code: &ShortCode) -> Result<String> {
        let row = sqlx::query(
            r#"
            SELECT original_url, deleted
            FROM urls
            WHERE short_code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(code.to_string()));
        };

        let deleted: bool = row.try_get("deleted").map_err(map_sqlx_error)?;
        if deleted {
            return Err(StorageError::Deleted(code.to_string()));
        }

        row.try_get("original_url").map_err(map_sqlx_error)
    }

    async fn get_urls(&self, owner: &OwnerId) -> Result<Vec<UrlRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT short_code, original_url, seq
            FROM urls
            WHERE owner_id = $1
              AND NOT deleted
            ORDER BY seq
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(|row| owned_record(row, owner)).collect()
    }

    async fn get_state(&self) -> Result<StoreState> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS urls, COUNT(DISTINCT owner_id) AS owners
            FROM urls
            WHERE NOT deleted
              AND owner_id <> ''
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let urls: i64 = row.try_get("urls").map_err(map_sqlx_error)?;
        let owners: i64 = row.try_get("owners").map_err(map_sqlx_error)?;

        Ok(StoreState {
            urls: urls as u64,
            owners: owners as u64,
        })
    }
}

#[async_trait]
impl UrlStore for PostgresStore {
    async fn set_url(&self, code: &ShortCode, url: &str, owner: &OwnerId) -> Result<SetUrlOutcome> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query(
            r#"
            INSERT INTO urls (short_code, original_url, owner_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (short_code) DO UPDATE SET short_code = EXCLUDED.short_code
            RETURNING seq, original_url, (xmax = 0) AS created
            "#,
        )
        .bind(code.as_str())
        .bind(url)
        .bind(owner.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let sequence: i64 = row.try_get("seq").map_err(map_sqlx_error)?;
        let created: bool = row.try_get("created").map_err(map_sqlx_error)?;
        if created {
            return Ok(SetUrlOutcome::Created { sequence });
        }

        let existing: String = row.try_get("original_url").map_err(map_sqlx_error)?;
        if existing == url {
            Ok(SetUrlOutcome::Conflict { sequence })
        } else {
            Err(StorageError::IdBusy(code.to_string()))
        }
    }

    async fn set_urls(&self, urls: Vec<NewUrl>, owner: &OwnerId) -> Result<Vec<UrlRecord>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut inserted = Vec::with_capacity(urls.len());

        for chunk in urls.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO urls (short_code, original_url, owner_id) ");
            builder.push_values(chunk, |mut row, url| {
                row.push_bind(url.code.as_str())
                    .push_bind(url.original_url.as_str())
                    .push_bind(owner.as_str());
            });
            builder.push(
                " ON CONFLICT (short_code) DO NOTHING RETURNING seq, short_code, original_url",
            );

            let rows = builder
                .build()
                .fetch_all(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            for row in &rows {
                inserted.push(owned_record(row, owner)?);
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        inserted.sort_by_key(|record| record.sequence);
        debug!(
            requested = urls.len(),
            inserted = inserted.len(),
            "bulk insert finished"
        );
        Ok(inserted)
    }

    async fn delete_urls(&self, owner: &OwnerId, codes: &[ShortCode]) -> Result<()> {
        if codes.is_empty() {
            return Ok(());
        }

        let codes: Vec<String> = codes.iter().map(|code| code.as_str().to_owned()).collect();
        let result = sqlx::query(
            r#"
            UPDATE urls
            SET deleted = TRUE
            WHERE short_code = ANY($1)
              AND owner_id = $2
              AND NOT deleted
            "#,
        )
        .bind(&codes)
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(
            owner = %owner,
            requested = codes.len(),
            deleted = result.rows_affected(),
            "soft-deleted urls"
        );
        Ok(())
    }
}
