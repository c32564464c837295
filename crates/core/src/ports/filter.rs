//! Backend-neutral filter expressions.
//!
//! A [`Filter`] is a small tagged tree of comparisons combined with
//! `AND`/`OR`. Data sources either translate it into their own query
//! language or evaluate it in-process with [`Filter::matches`].

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Document, compare_values, leaf};

/// Comparison operator on a named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    /// SQL-style operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        matches!(
            (self, ordering),
            (CompareOp::Eq, Ordering::Equal)
                | (CompareOp::Gt, Ordering::Greater)
                | (CompareOp::Lt, Ordering::Less)
        )
    }
}

/// Filter expression over documents.
///
/// The empty conjunction (`And(vec![])`, also [`Filter::all`]) matches
/// every document and is treated as "no constraint".
///
/// Serialized externally tagged: `{"and": [{"compare": {"field": "price",
/// "op": "gt", "value": 10}}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// `field <op> value` on a dotted field path.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// `field` holds a non-null value (`exists: true`), or is missing or
    /// null (`exists: false`).
    Exists { field: String, exists: bool },
    /// Every sub-filter matches.
    And(Vec<Filter>),
    /// At least one sub-filter matches.
    Or(Vec<Filter>),
}

impl Default for Filter {
    fn default() -> Self {
        Filter::And(Vec::new())
    }
}

impl Filter {
    /// The filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn compare(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Filter::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Filter::Exists {
            field: field.into(),
            exists: true,
        }
    }

    /// Missing or null `field`.
    pub fn missing(field: impl Into<String>) -> Self {
        Filter::Exists {
            field: field.into(),
            exists: false,
        }
    }

    /// The filter matching no document.
    pub fn none() -> Self {
        Filter::Or(Vec::new())
    }

    /// Conjunction of `filters`, dropping empty ones.
    ///
    /// A single remaining filter is returned as is.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts: Vec<Filter> = filters.into_iter().filter(|f| !f.is_empty()).collect();
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Filter::And(parts)
    }

    /// Disjunction of `filters`.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Whether this filter places no constraint at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::And(parts) => parts.iter().all(Filter::is_empty),
            _ => false,
        }
    }

    /// Evaluate this filter against a document.
    ///
    /// Comparisons only hold between values of the same JSON type, and never
    /// hold for a missing field.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Compare { field, op, value } => leaf(document, field)
                .and_then(|actual| compare_values(actual, value))
                .is_some_and(|ordering| op.accepts(ordering)),
            Filter::Exists { field, exists } => {
                leaf(document, field).is_some_and(|v| !v.is_null()) == *exists
            }
            Filter::And(parts) => parts.iter().all(|f| f.matches(document)),
            Filter::Or(parts) => parts.iter().any(|f| f.matches(document)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare { field, op, value } => write!(f, "{} {} {}", field, op.symbol(), value),
            Filter::Exists { field, exists: true } => write!(f, "{} IS NOT NULL", field),
            Filter::Exists { field, exists: false } => write!(f, "{} IS NULL", field),
            Filter::And(parts) if parts.is_empty() => f.write_str("TRUE"),
            Filter::Or(parts) if parts.is_empty() => f.write_str("FALSE"),
            Filter::And(parts) | Filter::Or(parts) => {
                let joiner = if matches!(self, Filter::And(_)) { " AND " } else { " OR " };
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
        }
    }
}
