//! In-memory document store.
//!
//! Collections live in a shared map behind an async `RwLock`. Filters and
//! sorts are evaluated in-process with [`Filter::matches`] and
//! [`Sort::compare`], so the ordering semantics here are the reference ones.
//!
//! # Usage
//!
//! ```ignore
//! let store = MemoryStore::new();
//! let people = store.collection("people");
//! people.insert(fixture_people).await?;
//!
//! let stories = store.collection("stories").with_reference("author", "people");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use relaypage_core::error::{StorageError, StorageResult};
use relaypage_core::models::{DEFAULT_ID_FIELD, Document, leaf};
use relaypage_core::ports::{DataSource, Filter, PopulateHint, Sort};

use crate::populate::{Reference, id_key, index_by_id, referenced_ids, replace_references};

type Collections = HashMap<String, Vec<Document>>;

/// Shared set of in-memory collections.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on a named collection, created empty on first insert.
    pub fn collection(&self, name: impl Into<String>) -> MemoryCollection {
        MemoryCollection {
            store: self.clone(),
            name: name.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            references: HashMap::new(),
        }
    }

    /// Names of the non-empty collections, sorted.
    pub async fn collection_names(&self) -> Vec<String> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Drop every collection, returning the number of documents removed.
    pub async fn clear(&self) -> u64 {
        let mut collections = self.collections.write().await;
        let removed = collections.values().map(Vec::len).sum::<usize>();
        collections.clear();
        removed as u64
    }
}

/// One collection of a [`MemoryStore`], usable as a [`DataSource`].
#[derive(Clone)]
pub struct MemoryCollection {
    store: MemoryStore,
    name: String,
    id_field: String,
    references: HashMap<String, Reference>,
}

impl MemoryCollection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Use `field` as the unique id for upserts.
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

    /// Insert documents, replacing any with the same id.
    ///
    /// Fails without inserting anything if a document has no id.
    pub async fn insert(&self, documents: impl IntoIterator<Item = Document>) -> StorageResult<u64> {
        let documents: Vec<Document> = documents.into_iter().collect();
        let keys = documents
            .iter()
            .map(|document| {
                leaf(document, &self.id_field).map(id_key).ok_or_else(|| {
                    StorageError::SerializationError(format!(
                        "document in {} has no {} field",
                        self.name, self.id_field
                    ))
                })
            })
            .collect::<StorageResult<Vec<String>>>()?;

        let mut collections = self.store.collections.write().await;
        let stored = collections.entry(self.name.clone()).or_default();
        let mut positions: HashMap<String, usize> = stored
            .iter()
            .enumerate()
            .filter_map(|(i, doc)| leaf(doc, &self.id_field).map(|id| (id_key(id), i)))
            .collect();

        let inserted = documents.len() as u64;
        for (key, document) in keys.into_iter().zip(documents) {
            match positions.get(&key) {
                Some(&i) => stored[i] = document,
                None => {
                    positions.insert(key, stored.len());
                    stored.push(document);
                }
            }
        }

        debug!(collection = %self.name, inserted, total = stored.len(), "Documents inserted");
        Ok(inserted)
    }

    /// Number of documents in the collection.
    pub async fn len(&self) -> usize {
        let collections = self.store.collections.read().await;
        collections.get(&self.name).map_or(0, Vec::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn populate(&self, collections: &Collections, documents: &mut [Document], hint: &PopulateHint) {
        for path in hint.paths() {
            let Some(reference) = self.references.get(path) else {
                warn!(collection = %self.name, path = %path, "No reference declared for populate path");
                continue;
            };
            let wanted: HashSet<String> = referenced_ids(documents, path).iter().map(id_key).collect();
            let candidates = collections
                .get(&reference.collection)
                .into_iter()
                .flatten()
                .filter(|doc| {
                    leaf(doc, &reference.id_field).is_some_and(|id| wanted.contains(&id_key(id)))
                })
                .cloned();
            let targets = index_by_id(candidates, &reference.id_field);
            replace_references(documents, path, &targets);
        }
    }
}

#[async_trait]
impl DataSource for MemoryCollection {
    #[instrument(skip_all, fields(collection = %self.name))]
    async fn count(&self, filter: &Filter, limit: Option<u64>) -> StorageResult<u64> {
        let collections = self.store.collections.read().await;
        let matched = collections
            .get(&self.name)
            .into_iter()
            .flatten()
            .filter(|doc| filter.matches(doc));
        let count = match limit.filter(|&l| l > 0) {
            Some(limit) => matched.take(limit as usize).count(),
            None => matched.count(),
        };
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
        let collections = self.store.collections.read().await;
        let mut documents: Vec<Document> = collections
            .get(&self.name)
            .into_iter()
            .flatten()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();

        documents.sort_by(|a, b| sort.compare(a, b));
        if let Some(limit) = limit.filter(|&l| l > 0) {
            documents.truncate(limit as usize);
        }

        if !populate.is_empty() {
            self.populate(&collections, &mut documents, populate);
        }

        debug!(found = documents.len(), "Documents read");
        Ok(documents)
    }
}
