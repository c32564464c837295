//! Reference population shared by the data sources.
//!
//! A reference field holds the id of a document in another collection, or an
//! array of ids. Populating replaces each id with the referenced document,
//! or `null` when it does not exist.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use relaypage_core::models::{DEFAULT_ID_FIELD, Document, leaf, leaf_mut};

/// Reference declared on a collection: dotted path -> target collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub collection: String,
    /// Id field of the target collection.
    pub id_field: String,
}

impl Reference {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    pub fn keyed_by(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }
}

/// Text key of an id value: its JSON rendering.
///
/// The string `"7"` and the number `7` are different ids.
pub fn id_key(id: &Value) -> String {
    id.to_string()
}

/// Distinct non-null ids referenced at `path` across `documents`, ordered by
/// key.
pub fn referenced_ids(documents: &[Document], path: &str) -> Vec<Value> {
    let mut ids: BTreeMap<String, Value> = BTreeMap::new();
    let values = documents.iter().filter_map(|document| leaf(document, path));
    for value in values {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        for id in items.iter().filter(|v| !v.is_null()) {
            ids.entry(id_key(id)).or_insert_with(|| id.clone());
        }
    }
    ids.into_values().collect()
}

/// Index `documents` by the key of their `id_field`, skipping those without one.
pub fn index_by_id(
    documents: impl IntoIterator<Item = Document>,
    id_field: &str,
) -> HashMap<String, Document> {
    documents
        .into_iter()
        .filter_map(|document| Some((id_key(leaf(&document, id_field)?), document)))
        .collect()
}

/// Replace the ids at `path` with their documents from `targets`.
pub fn replace_references(
    documents: &mut [Document],
    path: &str,
    targets: &HashMap<String, Document>,
) {
    let lookup = |id: &Value| targets.get(&id_key(id)).cloned().unwrap_or(Value::Null);

    for document in documents {
        let Some(slot) = leaf_mut(document, path) else {
            continue;
        };
        match slot {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter_mut().filter(|v| !v.is_null()) {
                    *item = lookup(item);
                }
            }
            single => *single = lookup(single),
        }
    }
}
