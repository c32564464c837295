//! Default cursor codec: base64 over a JSON `{field, id}` object.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{CursorError, CursorResult};
use crate::ports::Cursor;

use super::{CursorCodec, CursorPosition};

/// Upper bound on accepted token length, for untrusted cursor input.
const MAX_CURSOR_TOKEN_LEN: usize = 8 * 1024;

/// Base64-encoded UTF-8 JSON `{"field": value, "id": id}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCursorCodec;

impl JsonCursorCodec {
    /// Encode a cursor.
    pub fn encode_pair(field: &Value, id: &Value) -> Cursor {
        let payload = json!({ "field": field, "id": id });
        Cursor::new(STANDARD.encode(payload.to_string()))
    }

    /// Decode a cursor, reporting why it is malformed.
    ///
    /// The token may include surrounding whitespace, which is trimmed.
    pub fn try_decode(cursor: &Cursor) -> CursorResult<CursorPosition> {
        let token = cursor.as_str().trim();

        if token.is_empty() {
            return Err(CursorError::Empty);
        }

        if token.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(CursorError::TooLong {
                len: token.len(),
                max: MAX_CURSOR_TOKEN_LEN,
            });
        }

        let bytes = STANDARD.decode(token)?;
        let text = String::from_utf8(bytes)?;
        let Value::Object(mut payload) = serde_json::from_str::<Value>(&text)? else {
            return Err(CursorError::NotAnObject);
        };

        // A null field is a real position (missing sort values rank first);
        // a null id is not.
        Ok(CursorPosition {
            field: payload.remove("field"),
            id: payload.remove("id").filter(|v| !v.is_null()),
        })
    }
}

impl CursorCodec for JsonCursorCodec {
    fn encode(&self, field: &Value, id: &Value) -> Cursor {
        Self::encode_pair(field, id)
    }

    fn decode(&self, cursor: &Cursor) -> CursorPosition {
        Self::try_decode(cursor).unwrap_or_else(|e| {
            debug!(error = %e, "Ignoring malformed cursor");
            CursorPosition::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(field: Value, id: Value) {
        let codec = JsonCursorCodec;
        let cursor = codec.encode(&field, &id);
        assert_eq!(codec.decode(&cursor), CursorPosition::new(field, id));
    }

    #[test]
    fn test_round_trip_scalars() {
        round_trip(json!(42), json!("5a1f"));
        round_trip(json!(-3.25), json!(7));
        round_trip(json!("Light freighter"), json!("ship-1"));
        round_trip(json!("ünïcødé ✓"), json!("id with spaces"));
        round_trip(json!(true), json!(0));
        round_trip(Value::Null, json!("no-class"));
    }

    #[test]
    fn test_missing_keys_decode_to_absent() {
        let cursor = Cursor::new(STANDARD.encode(r#"{"field": 3, "id": null}"#));
        assert_eq!(
            JsonCursorCodec.decode(&cursor),
            CursorPosition {
                field: Some(json!(3)),
                id: None,
            }
        );
        let cursor = Cursor::new(STANDARD.encode("{}"));
        assert!(JsonCursorCodec.decode(&cursor).is_empty());
    }

    // Test critique: compatibilité du format avec les curseurs existants
    #[test]
    fn test_wire_format_is_base64_json() {
        let cursor = JsonCursorCodec::encode_pair(&json!("x"), &json!("1"));
        let decoded = STANDARD.decode(cursor.as_str()).unwrap();
        let value: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value, json!({"field": "x", "id": "1"}));
    }

    #[test]
    fn test_malformed_cursor_decodes_to_empty() {
        let codec = JsonCursorCodec;
        assert!(codec.decode(&Cursor::new("")).is_empty());
        assert!(codec.decode(&Cursor::new("not base64 !!")).is_empty());
        // Base64 valide mais pas du JSON
        assert!(codec.decode(&Cursor::new(STANDARD.encode("hello"))).is_empty());
        // JSON valide mais pas un objet
        assert!(codec.decode(&Cursor::new(STANDARD.encode("[1,2]"))).is_empty());
    }

    #[test]
    fn test_try_decode_reports_reason() {
        assert!(matches!(
            JsonCursorCodec::try_decode(&Cursor::new("   ")),
            Err(CursorError::Empty)
        ));
        let long = Cursor::new("A".repeat(MAX_CURSOR_TOKEN_LEN + 4));
        assert!(matches!(
            JsonCursorCodec::try_decode(&long),
            Err(CursorError::TooLong { .. })
        ));
        assert!(matches!(
            JsonCursorCodec::try_decode(&Cursor::new(STANDARD.encode([0xff, 0xfe]))),
            Err(CursorError::Utf8(_))
        ));
        assert!(matches!(
            JsonCursorCodec::try_decode(&Cursor::new(STANDARD.encode("\"text\""))),
            Err(CursorError::NotAnObject)
        ));
    }

    #[test]
    fn test_partial_payload_keeps_present_keys() {
        let cursor = Cursor::new(STANDARD.encode(r#"{"id": "r1"}"#));
        let position = JsonCursorCodec.decode(&cursor);
        assert_eq!(position.field, None);
        assert_eq!(position.id, Some(json!("r1")));
    }
}
