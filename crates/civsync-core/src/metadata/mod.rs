//! Local metadata files.
//!
//! This module provides:
//! - Reads that treat a missing file as "no data"
//! - Sidecar hash extraction for installed artifacts

mod files;
mod sidecar;

pub use files::read_optional;
pub use sidecar::{is_sidecar, read_sidecar_hash};
