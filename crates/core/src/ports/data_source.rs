//! Port trait for the backing collection.
//!
//! This trait defines the query interface consumed by the resolver.
//! Implementations live in the infrastructure layer (e.g., `relaypage-storage`).

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::Document;

use super::filter::Filter;
use super::pagination::Sort;

// =============================================================================
// Populate Hint
// =============================================================================

/// Related-record expansion requested by the caller.
///
/// The core passes this through untouched; each data source decides what
/// the listed paths mean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateHint {
    paths: Vec<String>,
}

impl PopulateHint {
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a whitespace-separated list of paths (`"author editor"`).
    pub fn parse(spec: &str) -> Self {
        Self {
            paths: spec.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PopulateHint {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Data Source
// =============================================================================

/// A queryable, sortable collection of documents.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Count documents matching `filter`.
    ///
    /// With a non-zero `limit`, counting stops once `limit` matches were
    /// seen, so the result never exceeds it.
    async fn count(&self, filter: &Filter, limit: Option<u64>) -> StorageResult<u64>;

    /// Read documents matching `filter`, ordered by `sort`.
    ///
    /// A `None` or `Some(0)` limit means unbounded.
    async fn find(
        &self,
        filter: &Filter,
        sort: &Sort,
        limit: Option<u64>,
        populate: &PopulateHint,
    ) -> StorageResult<Vec<Document>>;
}
