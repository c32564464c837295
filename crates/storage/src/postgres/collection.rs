//! Document collection implementation for PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument, warn};

use relaypage_core::error::{StorageError, StorageResult};
use relaypage_core::models::{DEFAULT_ID_FIELD, Document, leaf};
use relaypage_core::ports::{DataSource, Filter, PopulateHint, Sort};

use super::database::Database;
use super::sql::{path_segments, push_filter, push_order_by};
use crate::populate::{Reference, id_key, index_by_id, referenced_ids, replace_references};

// =============================================================================
// Store
// =============================================================================

/// Entry point handing out collections over one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub fn collection(&self, name: impl Into<String>) -> PgCollection {
        PgCollection {
            pool: self.pool.clone(),
            name: name.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            references: HashMap::new(),
        }
    }
}

// =============================================================================
// Collection
// =============================================================================

/// One named collection of the `documents` table.
#[derive(Clone)]
pub struct PgCollection {
    pool: PgPool,
    name: String,
    id_field: String,
    references: HashMap<String, Reference>,
}

impl PgCollection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Use `field` as the unique id stored in the `id` column.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Declare that `path` holds ids of documents in `collection`.
    pub fn with_reference(self, path: impl Into<String>, collection: impl Into<String>) -> Self {
        self.with_reference_to(path, Reference::new(collection))
    }

    /// Declare a reference whose target has its own id field.
    pub fn with_reference_to(mut self, path: impl Into<String>, reference: Reference) -> Self {
        self.references.insert(path.into(), reference);
        self
    }

    /// Insert documents in one transaction, replacing any with the same id.
    #[instrument(skip_all, fields(collection = %self.name, count = documents.len()))]
    pub async fn insert_documents(&self, documents: &[Document]) -> StorageResult<u64> {
        if documents.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        for document in documents {
            let id = leaf(document, &self.id_field).map(id_key).ok_or_else(|| {
                StorageError::SerializationError(format!(
                    "document in {} has no {} field",
                    self.name, self.id_field
                ))
            })?;

            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, doc)
                VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET
                    doc = EXCLUDED.doc,
                    inserted_at = NOW()
                "#,
            )
            .bind(&self.name)
            .bind(id)
            .bind(document)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        debug!("Documents inserted");
        Ok(documents.len() as u64)
    }

    fn select<'a>(&self, select: &str, filter: &Filter) -> QueryBuilder<'a, Postgres> {
        let mut builder = QueryBuilder::new(select);
        builder
            .push(" FROM documents WHERE collection = ")
            .push_bind(self.name.clone())
            .push(" AND ");
        push_filter(&mut builder, filter);
        builder
    }

    async fn populate(&self, documents: &mut [Document], hint: &PopulateHint) -> StorageResult<()> {
        for path in hint.paths() {
            let Some(reference) = self.references.get(path) else {
                warn!(collection = %self.name, path = %path, "No reference declared for populate path");
                continue;
            };
            let ids = referenced_ids(documents, path);
            if ids.is_empty() {
                continue;
            }

            // Matched on the target's id field as jsonb
            let rows: Vec<Value> = sqlx::query_scalar(
                "SELECT doc FROM documents \
                 WHERE collection = $1 AND (doc #> $2::text[]) = ANY($3::jsonb[])",
            )
            .bind(&reference.collection)
            .bind(path_segments(&reference.id_field))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

            let targets = index_by_id(rows, &reference.id_field);
            replace_references(documents, path, &targets);
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for PgCollection {
    #[instrument(skip_all, fields(collection = %self.name))]
    async fn count(&self, filter: &Filter, limit: Option<u64>) -> StorageResult<u64> {
        let mut builder = match limit.filter(|&l| l > 0) {
            // Bounded: stop scanning once `limit` rows matched
            Some(limit) => {
                let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM (");
                builder
                    .push("SELECT 1 FROM documents WHERE collection = ")
                    .push_bind(self.name.clone())
                    .push(" AND ");
                push_filter(&mut builder, filter);
                builder
                    .push(" LIMIT ")
                    .push_bind(limit as i64)
                    .push(") AS bounded");
                builder
            }
            None => self.select("SELECT COUNT(*)", filter),
        };

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(count as u64)
    }

    #[instrument(skip_all, fields(collection = %self.name))]
    async fn find(
        &self,
        filter: &Filter,
        sort: &Sort,
        limit: Option<u64>,
        populate: &PopulateHint,
    ) -> StorageResult<Vec<Document>> {
        let mut builder = self.select("SELECT doc", filter);
        push_order_by(&mut builder, sort);
        if let Some(limit) = limit.filter(|&l| l > 0) {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let mut documents: Vec<Document> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        if !populate.is_empty() {
            self.populate(&mut documents, populate).await?;
        }

        debug!(found = documents.len(), "Documents read");
        Ok(documents)
    }
}
