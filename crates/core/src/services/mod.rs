//! Pagination services.
//!
//! - [`resolve`] - Resolve one page of a connection
//! - [`range`] - Cursor boundaries and sort orders handed to data sources

pub mod range;
mod resolver;

pub use range::{Boundary, CompiledRange, RangeCompiler, SortSpec};
pub use resolver::{NodeMapper, ResolveOptions, resolve};
