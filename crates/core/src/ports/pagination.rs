//! Pagination types for list queries.
//!
//! These types implement Relay-style cursor pagination, commonly used
//! with GraphQL but also applicable to other APIs.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Document, compare_sort_values, leaf};

/// Opaque cursor for pagination.
///
/// The cursor value is codec-specific and should be treated
/// as an opaque token by clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub value: String,
}

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self { value }
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Pagination arguments supplied by the caller.
///
/// Supports forward pagination (`first`/`after`) and backward
/// pagination (`last`/`before`). When both `first` and `last` are
/// given, `last` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationRequest {
    /// Number of items to fetch (forward pagination).
    pub first: Option<i32>,
    /// Cursor to start after (forward pagination).
    pub after: Option<Cursor>,
    /// Number of items to fetch (backward pagination).
    pub last: Option<i32>,
    /// Cursor to end before (backward pagination).
    pub before: Option<Cursor>,
}

impl PaginationRequest {
    /// Request the first `first` items.
    pub fn first(first: i32) -> Self {
        Self {
            first: Some(first),
            ..Default::default()
        }
    }

    /// Request the last `last` items.
    pub fn last(last: i32) -> Self {
        Self {
            last: Some(last),
            ..Default::default()
        }
    }

    pub fn after(mut self, cursor: impl Into<Cursor>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn before(mut self, cursor: impl Into<Cursor>) -> Self {
        self.before = Some(cursor.into());
        self
    }
}

/// Paginated result set with edges and page info.
///
/// This is the Relay connection pattern for cursor-based pagination.
#[derive(Debug, Clone)]
pub struct Connection<T> {
    /// List of edges (node + cursor pairs).
    pub edges: Vec<Edge<T>>,
    /// Information about the current page.
    pub page_info: PageInfo,
    /// Number of items matching the base filter, ignoring cursors.
    pub total_count: u64,
}

/// A single item in a paginated result.
#[derive(Debug, Clone)]
pub struct Edge<T> {
    /// The actual item.
    pub node: T,
    /// Cursor for this item (used for pagination).
    pub cursor: Cursor,
}

/// Information about the current page in a paginated result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    ///
    /// Only computed for `first` requests; always false otherwise.
    pub has_next_page: bool,
    /// Whether there are items before this page.
    ///
    /// Only computed for `last` requests; always false otherwise.
    pub has_previous_page: bool,
    /// Cursor of the first item in this page.
    pub start_cursor: Option<Cursor>,
    /// Cursor of the last item in this page.
    pub end_cursor: Option<Cursor>,
}

// =============================================================================
// Ordering
// =============================================================================

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl OrderDirection {
    /// Interpret a signed direction (`1` ascending, `-1` descending).
    ///
    /// Zero is treated as ascending.
    pub fn from_sign(sign: i64) -> Self {
        if sign < 0 {
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        }
    }

    /// Interpret an untrusted direction value.
    ///
    /// Anything that is not a number falls back to ascending.
    pub fn from_value(value: &Value) -> Self {
        match value.as_f64() {
            Some(sign) if sign < 0.0 => OrderDirection::Desc,
            _ => OrderDirection::Asc,
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            OrderDirection::Asc => 1,
            OrderDirection::Desc => -1,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            OrderDirection::Asc => OrderDirection::Desc,
            OrderDirection::Desc => OrderDirection::Asc,
        }
    }

    /// Apply this direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        }
    }
}

/// One `(field, direction)` pair of a sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Dotted field path.
    pub field: String,
    pub direction: OrderDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Multi-key sort order, most significant key first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub keys: Vec<SortKey>,
}

impl Sort {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// The same keys with every direction inverted.
    pub fn reversed(&self) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|key| SortKey::new(key.field.clone(), key.direction.reverse()))
                .collect(),
        }
    }

    /// Compare two documents under this sort.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.keys {
            let ordering = key
                .direction
                .apply(compare_sort_values(leaf(a, &key.field), leaf(b, &key.field)));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
