//! Cursor codecs.
//!
//! A codec maps a `(sort value, id)` pair to an opaque [`Cursor`] and back.
//! Encoding only has to be reversible: the data source sorts on the decoded
//! field, never on the cursor string.
//!
//! Decoding through [`CursorCodec::decode`] never fails. A token that cannot
//! be decoded yields an empty [`CursorPosition`], which the resolver treats
//! as "no constraint". Callers that want strict validation use the codec's
//! `try_decode`.

mod date;
mod json;

pub use date::{DateCursorCodec, canonical_timestamp};
pub use json::JsonCursorCodec;

use std::fmt::Debug;

use serde_json::Value;

use crate::ports::Cursor;

/// Decoded contents of a cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorPosition {
    /// Sort-field value of the record the cursor points at.
    pub field: Option<Value>,
    /// Unique id of the record the cursor points at.
    pub id: Option<Value>,
}

impl CursorPosition {
    pub fn new(field: Value, id: Value) -> Self {
        Self {
            field: Some(field),
            id: Some(id),
        }
    }

    /// Whether decoding produced nothing usable.
    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.id.is_none()
    }
}

/// Pluggable cursor encoding.
pub trait CursorCodec: Debug + Send + Sync {
    /// Encode a sort value and id into an opaque cursor.
    fn encode(&self, field: &Value, id: &Value) -> Cursor;

    /// Decode a cursor, returning an empty position on malformed input.
    fn decode(&self, cursor: &Cursor) -> CursorPosition;
}
