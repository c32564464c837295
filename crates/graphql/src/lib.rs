//! GraphQL API for relaypage.
//!
//! Provides the Relay connection types and a demo catalog schema whose
//! fields are resolved with [`relaypage_core::services::resolve`].
//!
//! # Defining a connection field
//!
//! ```ignore
//! use relaypage_graphql::{define_connection, pagination_request};
//!
//! define_connection!(Starship, StarshipEdge, StarshipConnection);
//!
//! async fn all_starships(&self, ctx: &Context<'_>, first: Option<i32>, after: Option<String>)
//!     -> Result<StarshipConnection>
//! {
//!     let options = ResolveOptions::default().sort_by("starshipClass").map_node(Starship::from);
//!     let request = pagination_request(first, after, None, None);
//!     Ok(resolve(request, source, &Filter::all(), &options).await?.into())
//! }
//! ```

pub mod connection;
mod schema;
mod server;
mod types;

pub use connection::{PageInfo, pagination_request};
pub use schema::{
    Catalog, CatalogQuery, FILES, MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH, Order, PEOPLE, PRODUCTS,
    STARSHIPS, STORIES, STORY_AUTHOR, build_schema, schema_builder,
};
pub use server::{GRAPHQL_PATH, ServerConfig, router, serve_with_shutdown};
pub use types::CatalogSchema;
