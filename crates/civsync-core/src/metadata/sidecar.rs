//! Sidecar metadata files.
//!
//! A sidecar is a `.json` file stored next to an installed artifact. The only
//! field the engine reads is `sha256`.

use crate::config::CatalogConfig;
use crate::metadata::read_optional;
use crate::{CivsyncError, Result};
use serde_json::Value;
use std::path::Path;

/// Whether a path looks like a sidecar file.
pub fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CatalogConfig::SIDECAR_EXTENSION))
        .unwrap_or(false)
}

/// Read the normalized (uppercase) hash from a sidecar.
///
/// Returns `None` for a well-formed object without a usable `sha256`. Anything
/// that is not a JSON object is a [`CivsyncError::CorruptSidecar`].
pub fn read_sidecar_hash(path: &Path) -> Result<Option<String>> {
    let corrupt = |reason: String| CivsyncError::CorruptSidecar {
        path: path.to_path_buf(),
        reason,
    };

    let Some(contents) = read_optional(path).map_err(|e| corrupt(e.to_string()))? else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(&contents).map_err(|e| corrupt(e.to_string()))?;

    let Value::Object(map) = value else {
        return Err(corrupt("top-level value is not an object".into()));
    };

    Ok(map
        .get("sha256")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|hash| !hash.is_empty())
        .map(str::to_uppercase))
}
