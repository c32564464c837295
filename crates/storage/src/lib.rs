//! Storage layer for relaypage.
//!
//! This crate provides the [`DataSource`](relaypage_core::ports::DataSource)
//! implementations consumed by the resolver:
//!
//! - [`memory`] - In-process collections, evaluated with the core's filter
//!   and sort semantics
//! - [`postgres`] - JSONB documents in PostgreSQL, with filters and sorts
//!   translated to SQL
//!
//! Both support populating reference fields declared with
//! `with_reference`.
//!
//! # Usage
//!
//! ```ignore
//! use relaypage_storage::{Database, DatabaseConfig, PgStore};
//!
//! // Connect to the database
//! let config = DatabaseConfig::for_graphql(&database_url);
//! let db = Database::connect(&config).await?;
//!
//! // Run migrations
//! db.migrate().await?;
//!
//! let stories = PgStore::new(&db).collection("stories").with_reference("author", "people");
//! ```

pub mod memory;
pub mod postgres;
mod populate;

pub use memory::{MemoryCollection, MemoryStore};
pub use populate::Reference;
pub use postgres::{
    CollectionSize, Database, DatabaseConfig, PgCollection, PgStore, PurgeStats,
};
