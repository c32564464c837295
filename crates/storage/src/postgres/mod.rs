//! PostgreSQL storage adapter.
//!
//! Every collection shares one `documents` table keyed by
//! `(collection, id)`, with the document itself in a JSONB column.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgStore`] - Hands out collections over the pool
//! - [`PgCollection`] - One collection, implementing `DataSource`
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_graphql(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let starships = PgStore::new(&db).collection("starships");
//! ```

mod collection;
mod database;
mod sql;

pub use collection::{PgCollection, PgStore};
pub use database::{CollectionSize, Database, DatabaseConfig, PurgeStats};
