mod data_source;
mod filter;
mod pagination;

pub use data_source::*;
pub use filter::*;
pub use pagination::*;
