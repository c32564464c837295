//! Translation of filters and sorts into SQL over the `documents` table.
//!
//! Fields are addressed with `doc #> path`, where `path` is bound as a
//! `text[]`. Comparisons are bracketed by JSON type so that, as in the
//! in-memory store, values of different types never compare:
//!
//! ```text
//! (jsonb_typeof(doc #> $1::text[]) = jsonb_typeof($2::jsonb) AND doc #> $1::text[] > $2::jsonb)
//! ```
//!
//! A JSON `null` is handled like a missing field, both by
//! [`Filter::Exists`] and in `ORDER BY`.
//!
//! Every value is bound. Only operators, `ASC`/`DESC` and the fixed column
//! names are written into the SQL text.

use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use relaypage_core::ports::{Filter, OrderDirection, Sort};

/// Split a dotted field path into `text[]` segments.
pub fn path_segments(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

/// Append `filter` as a boolean SQL expression.
pub fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::Compare { field, op, value } => {
            builder.push("(jsonb_typeof(");
            push_field(builder, field);
            builder.push(") = jsonb_typeof(");
            push_value(builder, value);
            builder.push(") AND ");
            push_field(builder, field);
            builder.push(" ").push(op.symbol()).push(" ");
            push_value(builder, value);
            builder.push(")");
        }
        Filter::Exists { field, exists } => {
            builder.push("(COALESCE(jsonb_typeof(");
            push_field(builder, field);
            builder.push("), 'null') ");
            builder.push(if *exists { "<>" } else { "=" });
            builder.push(" 'null')");
        }
        Filter::And(parts) if parts.is_empty() => {
            builder.push("TRUE");
        }
        Filter::Or(parts) if parts.is_empty() => {
            builder.push("FALSE");
        }
        Filter::And(parts) | Filter::Or(parts) => {
            let joiner = if matches!(filter, Filter::And(_)) { " AND " } else { " OR " };
            builder.push("(");
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    builder.push(joiner);
                }
                push_filter(builder, part);
            }
            builder.push(")");
        }
    }
}

/// Append an `ORDER BY` clause, or nothing for an empty sort.
///
/// Missing and null fields sort first in ascending order and last in
/// descending order.
pub fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, sort: &Sort) {
    if sort.keys.is_empty() {
        return;
    }
    builder.push(" ORDER BY ");
    for (i, key) in sort.keys.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push("NULLIF(");
        push_field(builder, &key.field);
        builder.push(", 'null'::jsonb)");
        builder.push(match key.direction {
            OrderDirection::Asc => " ASC NULLS FIRST",
            OrderDirection::Desc => " DESC NULLS LAST",
        });
    }
}

fn push_field(builder: &mut QueryBuilder<'_, Postgres>, field: &str) {
    builder
        .push("(doc #> ")
        .push_bind(path_segments(field))
        .push("::text[])");
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    builder.push_bind(value.clone()).push("::jsonb");
}
