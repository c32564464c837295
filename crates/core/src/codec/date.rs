//! Cursor codec for date-valued sort fields.
//!
//! Dates travel as canonical UTC timestamps with millisecond precision
//! (`2017-06-05T12:00:00.000Z`), so decoded values compare correctly against
//! documents storing the same canonical form.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::{CursorError, CursorResult};
use crate::ports::Cursor;

use super::json::JsonCursorCodec;
use super::{CursorCodec, CursorPosition};

/// Canonical timestamp string for a date value.
///
/// Accepts RFC 3339 strings and epoch-millisecond numbers.
pub fn canonical_timestamp(value: &Value) -> Option<String> {
    let date: DateTime<Utc> = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc),
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?)?,
        _ => return None,
    };
    Some(date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// [`JsonCursorCodec`] with the field normalised to a canonical timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCursorCodec;

impl DateCursorCodec {
    /// Decode a cursor, failing when the field is not a timestamp.
    pub fn try_decode(cursor: &Cursor) -> CursorResult<CursorPosition> {
        let position = JsonCursorCodec::try_decode(cursor)?;
        let field = match position.field {
            Some(Value::Null) => Some(Value::Null),
            Some(field) => Some(Value::String(
                canonical_timestamp(&field)
                    .ok_or_else(|| CursorError::InvalidTimestamp(field.to_string()))?,
            )),
            None => None,
        };
        Ok(CursorPosition {
            field,
            id: position.id,
        })
    }
}

impl CursorCodec for DateCursorCodec {
    fn encode(&self, field: &Value, id: &Value) -> Cursor {
        match canonical_timestamp(field) {
            Some(timestamp) => JsonCursorCodec::encode_pair(&Value::String(timestamp), id),
            None => JsonCursorCodec::encode_pair(field, id),
        }
    }

    fn decode(&self, cursor: &Cursor) -> CursorPosition {
        Self::try_decode(cursor).unwrap_or_else(|e| {
            debug!(error = %e, "Ignoring malformed date cursor");
            CursorPosition::default()
        })
    }
}
