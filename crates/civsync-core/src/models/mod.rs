//! Data models for civsync.
//!
//! Remote records map directly to the catalog's JSON; the filter is the
//! local snapshot that drives query building and cache invalidation.

mod catalog;
mod content_type;
mod filter;

pub use catalog::*;
pub use content_type::*;
pub use filter::*;
