//! Catalog query building.
//!
//! Turns a [`CatalogFilter`] into a [`QueryPlan`]: either a ready request, or a
//! lookup that has to run first (download-link resolution, hash search).

use crate::catalog::CatalogSource;
use crate::models::{CatalogFilter, PageMetadata, SearchMode};
use crate::{CivsyncError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Matches the numeric model id in a pasted catalog page URL.
static MODEL_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"models/(\d+)").unwrap());

/// Matches the version id in a pasted download link.
static DOWNLOAD_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"download/models/(\d+)").unwrap());

/// Host marker that turns free text into a pasted-URL lookup.
const CATALOG_HOST: &str = "civitai.com";

/// A fully formed remote request (the URL that produced a page).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogRequest {
    pub url: String,
}

impl CatalogRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for CatalogRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Sequential navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    /// Page number reached by moving from `current` in this direction.
    pub fn step(&self, current: u32) -> u32 {
        match self {
            Direction::Previous => current.saturating_sub(1).max(1),
            Direction::Next => current + 1,
        }
    }
}

/// What has to happen to serve a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// Fetch this request directly.
    Request(CatalogRequest),
    /// Identifier lookup for a pasted model URL; other filters are dropped.
    ModelLookup {
        model_id: u64,
        request: CatalogRequest,
    },
    /// Look up the owning model of a version first, then fetch it by id.
    ResolveDownloadLink { version_id: u64, nsfw: bool },
    /// Content-hash search; served outside the page cache.
    HashLookup { hash: String },
}

/// Plan the request for a filter.
pub fn plan_query(api_base: &str, filter: &CatalogFilter) -> QueryPlan {
    let search = filter.trimmed_search();

    if filter.search_mode == SearchMode::Sha256 {
        return QueryPlan::HashLookup {
            hash: search.unwrap_or_default().to_string(),
        };
    }

    if let Some(text) = search.filter(|t| t.to_lowercase().contains(CATALOG_HOST)) {
        if let Some(version_id) = parse_download_version_id(text) {
            debug!("Search text is a download link for version {}", version_id);
            return QueryPlan::ResolveDownloadLink {
                version_id,
                nsfw: filter.nsfw,
            };
        }
        if let Some(model_id) = parse_model_id_from_url(text) {
            return QueryPlan::ModelLookup {
                model_id,
                request: ids_request(api_base, model_id, filter.nsfw),
            };
        }
    }

    QueryPlan::Request(build_request(api_base, filter))
}

/// Build the search request for a filter.
///
/// Parameter order: `limit`, `sort`, `period`, repeated `types`, the search
/// term, repeated `baseModels`, `favorites`, `nsfw`.
pub fn build_request(api_base: &str, filter: &CatalogFilter) -> CatalogRequest {
    let mut params: Vec<(&str, String)> = vec![
        ("limit", filter.effective_page_size().to_string()),
        ("sort", filter.sort.as_str().to_string()),
        ("period", filter.period.as_param().to_string()),
    ];

    for content_type in &filter.content_types {
        params.push(("types", content_type.as_str().to_string()));
    }

    // Pasted URLs that are not model or download links carry no usable term.
    if let Some(text) = filter
        .trimmed_search()
        .filter(|t| !t.to_lowercase().contains(CATALOG_HOST))
    {
        let key = match filter.search_mode {
            SearchMode::UserName => "username",
            SearchMode::Tag => "tag",
            SearchMode::ModelName | SearchMode::Sha256 => "query",
        };
        params.push((key, text.to_lowercase()));
    }

    for base_model in &filter.base_models {
        params.push(("baseModels", base_model.clone()));
    }

    if filter.favorites_only {
        params.push(("favorites", "true".to_string()));
    }

    params.push(("nsfw", filter.nsfw.to_string()));

    let request = CatalogRequest::new(format!("{}/models?{}", api_base, encode_params(&params)));
    debug!("Built catalog request {}", request);
    request
}

/// Identifier lookup for a single model. Other filters are discarded.
pub fn ids_request(api_base: &str, model_id: u64, nsfw: bool) -> CatalogRequest {
    CatalogRequest::new(format!(
        "{}/models?ids={}&nsfw={}",
        api_base, model_id, nsfw
    ))
}

pub fn version_url(api_base: &str, version_id: u64) -> String {
    format!("{}/model-versions/{}", api_base, version_id)
}

pub fn version_by_hash_url(api_base: &str, hash: &str) -> String {
    format!(
        "{}/model-versions/by-hash/{}",
        api_base,
        urlencoding::encode(hash)
    )
}

pub fn model_url(api_base: &str, model_id: u64) -> String {
    format!("{}/models/{}", api_base, model_id)
}

/// The link stored on the last fetched page for a direction.
///
/// `target_page` is only used to report which page is unreachable.
pub fn link_for_direction(
    metadata: &PageMetadata,
    direction: Direction,
    target_page: u32,
) -> Result<CatalogRequest> {
    let link = match direction {
        Direction::Previous => metadata.prev_page.as_deref(),
        Direction::Next => metadata.next_page.as_deref(),
    };
    link.filter(|l| !l.is_empty())
        .map(CatalogRequest::new)
        .ok_or(CivsyncError::NoSuchPage { page: target_page })
}

pub fn parse_model_id_from_url(text: &str) -> Option<u64> {
    MODEL_URL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn parse_download_version_id(text: &str) -> Option<u64> {
    DOWNLOAD_URL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Resolve a download link to the owning model id and its identifier lookup.
///
/// Any failure of the version sub-request is reported as
/// [`CivsyncError::ModelNotFound`].
pub async fn resolve_download_link(
    source: &dyn CatalogSource,
    version_id: u64,
    nsfw: bool,
) -> Result<(u64, CatalogRequest)> {
    let version = match source.fetch_version(version_id).await {
        Ok(version) => version,
        Err(e) => {
            warn!("Failed to resolve version {}: {}", version_id, e);
            return Err(CivsyncError::ModelNotFound {
                model_id: format!("version {}", version_id),
            });
        }
    };

    let model_id = version.model_id.ok_or_else(|| CivsyncError::ModelNotFound {
        model_id: format!("version {}", version_id),
    })?;

    Ok((model_id, ids_request(source.api_base(), model_id, nsfw)))
}

fn encode_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
