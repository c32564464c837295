//! Core domain layer for relaypage.
//!
//! This crate contains the cursor codecs, port traits, and the pagination
//! resolver. It follows hexagonal architecture principles - this is the
//! innermost layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    relaypage (binary)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    relaypage-graphql                        │
//! │              (connection types, demo schema)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    relaypage-storage                        │
//! │                (in-memory, PostgreSQL)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  relaypage-core  ← YOU ARE HERE             │
//! │           (codec, ports, resolver, range compiler)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Documents and dotted-path field access
//! - [`codec`] - Cursor encoding ([`codec::JsonCursorCodec`], [`codec::DateCursorCodec`])
//! - [`ports`] - Pagination types, filters and the [`ports::DataSource`] trait
//! - [`services`] - Range compilation and [`services::resolve`]
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Resolving a page
//!
//! ```no_run
//! use relaypage_core::ports::{DataSource, Filter, PaginationRequest};
//! use relaypage_core::services::{ResolveOptions, resolve};
//!
//! async fn first_ten(source: &dyn DataSource) -> relaypage_core::error::PaginationResult<()> {
//!     let options = ResolveOptions::default().sort_by("starshipClass");
//!     let page = resolve(PaginationRequest::first(10), source, &Filter::all(), &options).await?;
//!     println!("{} of {}", page.edges.len(), page.total_count);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
