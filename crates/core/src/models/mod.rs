//! Document model shared by the core and every data source.
//!
//! Documents are untyped JSON records. Fields are addressed by dotted paths
//! (`stats.size`, `tags.0`) and compared with MongoDB-style type bracketing:
//! values of different JSON types never compare with each other, but a sort
//! still places every value in a single total order.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// A record as stored in and returned by a data source.
pub type Document = Value;

/// Default unique id field of a document.
pub const DEFAULT_ID_FIELD: &str = "id";

// =============================================================================
// Dotted-path access
// =============================================================================

/// Get the nested leaf value at a dotted `path`.
///
/// Object segments are looked up by key, array segments by numeric index.
/// Returns `None` as soon as a segment is missing.
///
/// ```
/// use relaypage_core::models::leaf;
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": {"c": "nat"}}});
/// assert_eq!(leaf(&doc, "a.b.c"), Some(&json!("nat")));
/// ```
pub fn leaf<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable counterpart of [`leaf`].
pub fn leaf_mut<'a>(document: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

// =============================================================================
// Value ordering
// =============================================================================

/// Compare two scalar values of the same JSON type.
///
/// Returns `None` for values of different types, and for objects and arrays.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

/// Rank of a value's type in the sort order.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order over possibly-missing field values, used for sorting.
///
/// Missing and null values sort first, then numbers, strings, objects,
/// arrays and booleans. Objects and arrays compare equal among themselves.
pub fn compare_sort_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_walks_nested_objects_and_arrays() {
        let doc = json!({"stats": {"size": 42}, "tags": ["a", {"k": "v"}]});
        assert_eq!(leaf(&doc, "stats.size"), Some(&json!(42)));
        assert_eq!(leaf(&doc, "tags.1.k"), Some(&json!("v")));
        assert_eq!(leaf(&doc, "stats"), Some(&json!({"size": 42})));
    }

    #[test]
    fn test_leaf_missing_segments() {
        let doc = json!({"stats": {"size": 42}, "tags": ["a"]});
        assert!(leaf(&doc, "stats.missing").is_none());
        assert!(leaf(&doc, "stats.size.deeper").is_none());
        assert!(leaf(&doc, "tags.5").is_none());
        assert!(leaf(&doc, "tags.x").is_none());
    }

    #[test]
    fn test_leaf_mut_replaces_in_place() {
        let mut doc = json!({"author": "p1"});
        *leaf_mut(&mut doc, "author").unwrap() = json!({"id": "p1", "name": "Ann"});
        assert_eq!(leaf(&doc, "author.name"), Some(&json!("Ann")));
    }

    // Test critique: pas de comparaison entre types différents (type bracketing)
    #[test]
    fn test_compare_values_type_bracketing() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(1.5), &json!(1)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
        assert_eq!(compare_values(&json!({}), &json!({})), None);
    }

    #[test]
    fn test_compare_sort_values_total_order() {
        assert_eq!(compare_sort_values(None, Some(&json!(0))), Ordering::Less);
        assert_eq!(
            compare_sort_values(Some(&json!(99)), Some(&json!("a"))),
            Ordering::Less
        );
        assert_eq!(
            compare_sort_values(Some(&Value::Null), None),
            Ordering::Equal
        );
        assert_eq!(
            compare_sort_values(Some(&json!(true)), Some(&json!([1]))),
            Ordering::Greater
        );
    }
}
