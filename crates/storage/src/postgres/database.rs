//! Connection pool, migrations and maintenance of the `documents` table.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

use relaypage_core::error::{StorageError, StorageResult};

/// Pool settings for [`Database::connect`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a resolution may wait for a free connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("postgres://localhost/relaypage")
    }
}

impl DatabaseConfig {
    /// General purpose settings for `url`.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }

    /// Settings for serving GraphQL. A resolution issues up to five
    /// concurrent reads.
    pub fn for_graphql(url: &str) -> Self {
        Self {
            max_connections: 15,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(900),
            ..Self::new(url)
        }
    }

    /// Override the pool bounds.
    pub fn with_pool_size(mut self, min: u32, max: u32) -> Self {
        self.min_connections = min.min(max);
        self.max_connections = max;
        self
    }
}

/// Shared handle on the pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[instrument(skip_all)]
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        debug!(
            max_conn = config.max_connections,
            min_conn = config.min_connections,
            acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
            "Opening document pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect(&config.url)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled migrations (the `documents` table and its index).
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::MigrationError(e.to_string()))?;

        debug!("Document schema up to date");
        Ok(())
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::ConnectionError(e.to_string()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Number of documents per collection, ordered by collection name.
    #[instrument(skip(self))]
    pub async fn collection_sizes(&self) -> StorageResult<Vec<CollectionSize>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(collection, documents)| CollectionSize {
                collection,
                documents: documents.max(0) as u64,
            })
            .collect())
    }

    /// Delete stored documents, from one collection or from all of them.
    ///
    /// The schema and the migration history are left in place.
    #[instrument(skip(self))]
    pub async fn purge(&self, collection: Option<&str>) -> StorageResult<PurgeStats> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        let stats = match collection {
            Some(name) => {
                let removed = sqlx::query("DELETE FROM documents WHERE collection = $1")
                    .bind(name)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StorageError::QueryError(e.to_string()))?
                    .rows_affected();

                PurgeStats {
                    documents_removed: removed,
                    collections_removed: u64::from(removed > 0),
                }
            }
            None => {
                let (documents, collections): (i64, i64) = sqlx::query_as(
                    "SELECT COUNT(*), COUNT(DISTINCT collection) FROM documents",
                )
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| StorageError::QueryError(e.to_string()))?;

                sqlx::query("TRUNCATE documents")
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StorageError::QueryError(e.to_string()))?;

                PurgeStats {
                    documents_removed: documents.max(0) as u64,
                    collections_removed: collections.max(0) as u64,
                }
            }
        };

        tx.commit()
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        info!(
            documents = stats.documents_removed,
            collections = stats.collections_removed,
            "Documents purged"
        );
        Ok(stats)
    }
}

/// One row of [`Database::collection_sizes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSize {
    pub collection: String,
    pub documents: u64,
}

/// Outcome of [`Database::purge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub documents_removed: u64,
    /// Collections left empty by the purge.
    pub collections_removed: u64,
}
