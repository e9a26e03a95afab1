//! Content-hash search.

use crate::catalog::CatalogSource;
use crate::models::{ModelRecord, ModelVersion};
use crate::{CivsyncError, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static SHA256_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9A-F]{64}$").unwrap());

/// Result of a successful hash search.
#[derive(Debug, Clone)]
pub struct HashMatch {
    /// Normalized hash that was searched.
    pub hash: String,
    /// The version that published a file with this hash.
    pub version: ModelVersion,
    /// The model owning that version.
    pub model: ModelRecord,
}

/// Trim and uppercase a hash, rejecting anything but 64 hex digits.
pub fn normalize_hash(input: &str) -> Result<String> {
    let hash = input.trim().to_uppercase();
    if SHA256_RE.is_match(&hash) {
        Ok(hash)
    } else {
        Err(CivsyncError::InvalidHash {
            input: input.to_string(),
        })
    }
}

/// Find the version and model that published a file with this hash.
///
/// A 404 from the version lookup is [`CivsyncError::HashNotFound`]; a missing
/// owning model is [`CivsyncError::ModelNotFound`]. Other failures propagate
/// unchanged.
pub async fn lookup_by_hash(source: &dyn CatalogSource, input: &str) -> Result<HashMatch> {
    let hash = normalize_hash(input)?;
    debug!("Looking up version by hash {}", hash);

    let version = source
        .fetch_version_by_hash(&hash)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                CivsyncError::HashNotFound { hash: hash.clone() }
            } else {
                e
            }
        })?;

    let model_id = version.model_id.ok_or_else(|| CivsyncError::ModelNotFound {
        model_id: format!("owner of version {}", version.id),
    })?;

    let model = source.fetch_model(model_id).await.map_err(|e| {
        if e.is_not_found() {
            CivsyncError::ModelNotFound {
                model_id: model_id.to_string(),
            }
        } else {
            e
        }
    })?;

    info!(
        "Hash {} belongs to {} version {}",
        hash, model.name, version.name
    );
    Ok(HashMatch {
        hash,
        version,
        model,
    })
}
