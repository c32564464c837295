//! GraphQL type definitions.

use async_graphql::{EmptyMutation, EmptySubscription, Schema};

use crate::schema::CatalogQuery;

/// The demo catalog schema type.
pub type CatalogSchema = Schema<CatalogQuery, EmptyMutation, EmptySubscription>;
