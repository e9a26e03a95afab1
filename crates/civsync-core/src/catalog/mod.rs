//! Remote catalog access.
//!
//! This module provides:
//! - The [`CatalogSource`] seam the session talks to
//! - A reqwest-backed implementation for the public REST API
//! - Query building, page caching and hash search

mod civitai;
mod hash_lookup;
mod pagination;
mod query;
mod visibility;

pub use civitai::CivitaiClient;
pub use hash_lookup::{lookup_by_hash, normalize_hash, HashMatch};
pub use pagination::{Navigation, PageCache};
pub use query::{
    build_request, ids_request, link_for_direction, model_url, parse_download_version_id,
    parse_model_id_from_url, plan_query, resolve_download_link, version_by_hash_url, version_url,
    CatalogRequest, Direction, QueryPlan,
};
pub use visibility::{filter_page, retain_visible_versions};

use crate::models::{CatalogPage, ModelRecord, ModelVersion};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A remote model catalog.
///
/// Errors follow the crate taxonomy: a 404 is a [`crate::CivsyncError::Network`]
/// with `status: Some(404)`, timeouts are [`crate::CivsyncError::Timeout`], and a
/// non-JSON answer is [`crate::CivsyncError::ServiceUnavailable`].
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Base URL requests are built against, e.g. `https://civitai.com/api/v1`.
    fn api_base(&self) -> &str;

    /// Fetch one page of search results.
    async fn fetch_page(&self, request: &CatalogRequest) -> Result<CatalogPage>;

    /// `GET /model-versions/{id}`.
    async fn fetch_version(&self, version_id: u64) -> Result<ModelVersion>;

    /// `GET /model-versions/by-hash/{hash}`.
    async fn fetch_version_by_hash(&self, hash: &str) -> Result<ModelVersion>;

    /// `GET /models/{id}`.
    async fn fetch_model(&self, model_id: u64) -> Result<ModelRecord>;
}

pub type DynCatalogSource = Arc<dyn CatalogSource>;
