//! Relay connection types.
//!
//! [`define_connection!`] wraps a GraphQL node type into an edge type and a
//! connection type carrying `edges`, `pageInfo` and `totalCount`, plus the
//! conversion from the core [`Connection`](relaypage_core::ports::Connection)
//! produced by `resolve`.

use relaypage_core::ports::{Cursor, PaginationRequest};

#[doc(hidden)]
pub use relaypage_core::ports::Connection as CoreConnection;

/// Page information of a connection.
///
/// Absent cursors (empty page) are rendered as the empty string.
#[derive(async_graphql::SimpleObject, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: String,
    pub end_cursor: String,
}

impl From<relaypage_core::ports::PageInfo> for PageInfo {
    fn from(info: relaypage_core::ports::PageInfo) -> Self {
        Self {
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
            start_cursor: info.start_cursor.map(|c| c.value).unwrap_or_default(),
            end_cursor: info.end_cursor.map(|c| c.value).unwrap_or_default(),
        }
    }
}

/// Build a request from the standard `first`/`after`/`last`/`before`
/// connection arguments.
pub fn pagination_request(
    first: Option<i32>,
    after: Option<String>,
    last: Option<i32>,
    before: Option<String>,
) -> PaginationRequest {
    PaginationRequest {
        first,
        after: after.map(Cursor::from),
        last,
        before: before.map(Cursor::from),
    }
}

/// Generate Relay-style connection types (Edge + Connection) with From impl.
///
/// The node type must already be a GraphQL output type; map documents into
/// it with `ResolveOptions::map_node`.
///
/// ```ignore
/// define_connection!(Starship, StarshipEdge, StarshipConnection);
///
/// let connection: StarshipConnection = resolve(request, source, &filter, &options).await?.into();
/// ```
#[macro_export]
macro_rules! define_connection {
    ($node:ty, $edge:ident, $connection:ident) => {
        #[derive(async_graphql::SimpleObject)]
        pub struct $edge {
            pub node: $node,
            pub cursor: String,
        }

        #[derive(async_graphql::SimpleObject)]
        pub struct $connection {
            pub edges: Vec<$edge>,
            pub page_info: $crate::connection::PageInfo,
            pub total_count: i64,
        }

        impl From<$crate::connection::CoreConnection<$node>> for $connection {
            fn from(conn: $crate::connection::CoreConnection<$node>) -> Self {
                Self {
                    edges: conn
                        .edges
                        .into_iter()
                        .map(|e| $edge {
                            node: e.node,
                            cursor: e.cursor.value,
                        })
                        .collect(),
                    page_info: conn.page_info.into(),
                    total_count: i64::try_from(conn.total_count).unwrap_or(i64::MAX),
                }
            }
        }
    };
}
