//! GraphQL schema definition.
//!
//! This module provides the demo catalog schema: four connection fields,
//! each exercising one pagination shape.
//!
//! | Field          | Collection  | Sort                              |
//! |----------------|-------------|-----------------------------------|
//! | `allStarships` | `starships` | `starshipClass` (non-unique)      |
//! | `allProducts`  | `products`  | `price`, direction from `order`   |
//! | `allFiles`     | `files`     | nested `stats.size`               |
//! | `allStories`   | `stories`   | id, `author` populated            |

use std::sync::Arc;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ID, Object, Result, Schema, SchemaBuilder,
    SimpleObject,
};
use serde_json::{Value, json};

use relaypage_core::models::{DEFAULT_ID_FIELD, Document, leaf};
use relaypage_core::ports::{DataSource, Filter, OrderDirection, PopulateHint};
use relaypage_core::services::{ResolveOptions, resolve};

use crate::connection::pagination_request;
use crate::types::CatalogSchema;

// -----------------------------------------------------------------------------
// Schema Configuration
// -----------------------------------------------------------------------------

/// Maximum query depth to prevent deeply nested queries (DoS protection).
/// Note: GraphQL introspection requires depth ~13, so we use 15 to allow it.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score (DoS protection).
/// Each field has a default complexity of 1, nested objects multiply.
pub const MAX_QUERY_COMPLEXITY: usize = 500;

/// Collection names backing the catalog.
pub const STARSHIPS: &str = "starships";
pub const PRODUCTS: &str = "products";
pub const FILES: &str = "files";
pub const STORIES: &str = "stories";
pub const PEOPLE: &str = "people";

/// Reference path of a story's author, pointing into [`PEOPLE`].
pub const STORY_AUTHOR: &str = "author";

// -----------------------------------------------------------------------------
// Catalog
// -----------------------------------------------------------------------------

/// Data sources queried by [`CatalogQuery`].
#[derive(Clone)]
pub struct Catalog {
    pub starships: Arc<dyn DataSource>,
    pub products: Arc<dyn DataSource>,
    pub files: Arc<dyn DataSource>,
    /// Must resolve the [`STORY_AUTHOR`] populate path.
    pub stories: Arc<dyn DataSource>,
}

impl Catalog {
    /// Open every collection by name.
    pub fn from_collections(mut open: impl FnMut(&'static str) -> Arc<dyn DataSource>) -> Self {
        Self {
            starships: open(STARSHIPS),
            products: open(PRODUCTS),
            files: open(FILES),
            stories: open(STORIES),
        }
    }
}

// -----------------------------------------------------------------------------
// Schema Builder
// -----------------------------------------------------------------------------

/// Build the catalog schema with query depth and complexity limits.
pub fn build_schema(catalog: Catalog) -> CatalogSchema {
    schema_builder(catalog)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

/// Create a schema builder with the catalog data.
///
/// Remember to call `.limit_depth()` and `.limit_complexity()` before `.finish()`.
pub fn schema_builder(
    catalog: Catalog,
) -> SchemaBuilder<CatalogQuery, EmptyMutation, EmptySubscription> {
    Schema::build(CatalogQuery, EmptyMutation, EmptySubscription).data(catalog)
}

// -----------------------------------------------------------------------------
// Catalog Query
// -----------------------------------------------------------------------------

/// Query root of the demo catalog.
#[derive(Default)]
pub struct CatalogQuery;

#[Object]
impl CatalogQuery {
    /// Starships ordered by class, then id.
    async fn all_starships<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> Result<StarshipConnection> {
        let catalog = ctx.data::<Catalog>()?;

        let options = ResolveOptions::default()
            .sort_by("starshipClass")
            .map_node(Starship::from);

        let connection = resolve(
            pagination_request(first, after, last, before),
            catalog.starships.as_ref(),
            &Filter::all(),
            &options,
        )
        .await?;

        Ok(connection.into())
    }

    /// Products ordered by price.
    #[allow(clippy::too_many_arguments)]
    async fn all_products<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
        #[graphql(default)] order: Order,
        price_above: Option<f64>,
    ) -> Result<ProductConnection> {
        let catalog = ctx.data::<Catalog>()?;

        let base = price_above
            .map(|price| Filter::gt("price", json!(price)))
            .unwrap_or_default();
        let options = ResolveOptions::default()
            .sort_by("price")
            .direction(order.into())
            .map_node(Product::from);

        let connection = resolve(
            pagination_request(first, after, last, before),
            catalog.products.as_ref(),
            &base,
            &options,
        )
        .await?;

        Ok(connection.into())
    }

    /// Files ordered by size.
    async fn all_files<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> Result<FileConnection> {
        let catalog = ctx.data::<Catalog>()?;

        let options = ResolveOptions::default()
            .sort_by("stats.size")
            .map_node(File::from);

        let connection = resolve(
            pagination_request(first, after, last, before),
            catalog.files.as_ref(),
            &Filter::all(),
            &options,
        )
        .await?;

        Ok(connection.into())
    }

    /// Stories with their author.
    async fn all_stories<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> Result<StoryConnection> {
        let catalog = ctx.data::<Catalog>()?;

        let options = ResolveOptions::default()
            .populate(PopulateHint::parse(STORY_AUTHOR))
            .map_node(Story::from);

        let connection = resolve(
            pagination_request(first, after, last, before),
            catalog.stories.as_ref(),
            &Filter::all(),
            &options,
        )
        .await?;

        Ok(connection.into())
    }
}

// -----------------------------------------------------------------------------
// GraphQL Types
// -----------------------------------------------------------------------------

/// Ordering direction.
#[derive(async_graphql::Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl From<Order> for OrderDirection {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => OrderDirection::Asc,
            Order::Desc => OrderDirection::Desc,
        }
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Starship {
    pub id: ID,
    pub model: Option<String>,
    pub starship_class: Option<String>,
}

impl From<Document> for Starship {
    fn from(doc: Document) -> Self {
        Self {
            id: id_of(&doc),
            model: text(&doc, "model"),
            starship_class: text(&doc, "starshipClass"),
        }
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ID,
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl From<Document> for Product {
    fn from(doc: Document) -> Self {
        Self {
            id: id_of(&doc),
            name: text(&doc, "name"),
            price: leaf(&doc, "price").and_then(Value::as_f64),
        }
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct FileStats {
    pub size: Option<i64>,
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct File {
    pub id: ID,
    pub name: Option<String>,
    pub stats: Option<FileStats>,
}

impl From<Document> for File {
    fn from(doc: Document) -> Self {
        Self {
            id: id_of(&doc),
            name: text(&doc, "name"),
            stats: leaf(&doc, "stats").filter(|v| v.is_object()).map(|stats| FileStats {
                size: leaf(stats, "size").and_then(Value::as_i64),
            }),
        }
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Person {
    pub id: ID,
    pub name: Option<String>,
}

impl From<&Document> for Person {
    fn from(doc: &Document) -> Self {
        Self {
            id: id_of(doc),
            name: text(doc, "name"),
        }
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Story {
    pub id: ID,
    pub title: Option<String>,
    /// `null` when the author was not found.
    pub author: Option<Person>,
}

impl From<Document> for Story {
    fn from(doc: Document) -> Self {
        Self {
            id: id_of(&doc),
            title: text(&doc, "title"),
            author: leaf(&doc, STORY_AUTHOR)
                .filter(|v| v.is_object())
                .map(Person::from),
        }
    }
}

// -----------------------------------------------------------------------------
// Connection Types (Relay-style pagination)
// -----------------------------------------------------------------------------

crate::define_connection!(Starship, StarshipEdge, StarshipConnection);
crate::define_connection!(Product, ProductEdge, ProductConnection);
crate::define_connection!(File, FileEdge, FileConnection);
crate::define_connection!(Story, StoryEdge, StoryConnection);

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Scalar at `path` as text; `None` when missing or null.
fn text(doc: &Document, path: &str) -> Option<String> {
    match leaf(doc, path)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn id_of(doc: &Document) -> ID {
    ID(text(doc, DEFAULT_ID_FIELD).unwrap_or_default())
}
