//! Remote catalog records.
//!
//! These types mirror the JSON returned by the catalog's REST API. Every
//! optional field defaults so partially populated responses still parse.

use crate::models::ContentType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    #[serde(default)]
    pub items: Vec<ModelRecord>,
    #[serde(default)]
    pub metadata: PageMetadata,
}

/// Navigation links and counters attached to a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// Model author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A catalog entry with its ordered versions (newest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub creator: Option<Creator>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub allow_no_credit: Option<bool>,
    #[serde(default)]
    pub allow_commercial_use: Option<serde_json::Value>,
    #[serde(default)]
    pub allow_derivatives: Option<bool>,
    #[serde(default)]
    pub allow_different_license: Option<bool>,
    #[serde(default)]
    pub model_versions: Vec<ModelVersion>,
}

impl ModelRecord {
    /// `"<name> (<id>)"`, the string model pickers use.
    pub fn selector_label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }

    pub fn version(&self, version_id: u64) -> Option<&ModelVersion> {
        self.model_versions.iter().find(|v| v.id == version_id)
    }

    pub fn version_by_name(&self, name: &str) -> Option<&ModelVersion> {
        self.model_versions.iter().find(|v| v.name == name)
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn creator_name(&self) -> Option<&str> {
        self.creator.as_ref().and_then(|c| c.username.as_deref())
    }
}

/// Release state of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Availability {
    #[default]
    #[serde(rename = "Public", alias = "Normal")]
    Normal,
    EarlyAccess,
    #[serde(other)]
    Other,
}

/// Preview media attached to a version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelImage {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

/// One published version of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersion {
    pub id: u64,
    #[serde(default)]
    pub model_id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub early_access_deadline: Option<String>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub base_model: Option<String>,
    #[serde(default)]
    pub trained_words: Vec<String>,
    #[serde(default)]
    pub files: Vec<ModelFile>,
    #[serde(default)]
    pub images: Vec<ModelImage>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ModelVersion {
    /// The canonical file: the first one marked primary, else the first file.
    pub fn primary_file(&self) -> Option<&ModelFile> {
        self.files
            .iter()
            .find(|f| f.primary)
            .or_else(|| self.files.first())
    }

    pub fn file(&self, file_id: u64) -> Option<&ModelFile> {
        self.files.iter().find(|f| f.id == file_id)
    }

    pub fn file_by_name(&self, name: &str) -> Option<&ModelFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Calendar date part of `publishedAt`.
    pub fn published_date(&self) -> Option<NaiveDate> {
        let raw = self.published_at.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.date_naive());
        }
        raw.split('T')
            .next()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    pub fn early_access_deadline(&self) -> Option<DateTime<Utc>> {
        self.early_access_deadline
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Whether the early-access window is still open at `now`.
    pub fn in_early_access(&self, now: DateTime<Utc>) -> bool {
        self.early_access_deadline()
            .map(|deadline| now <= deadline)
            .unwrap_or(false)
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.images.first().map(|img| img.url.as_str())
    }
}

/// Format details of a downloadable file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub fp: Option<String>,
}

/// A downloadable file of a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFile {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "sizeKB")]
    pub size_kb: Option<f64>,
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
    #[serde(default)]
    pub hashes: HashMap<String, String>,
    #[serde(default)]
    pub metadata: FileMetadata,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ModelFile {
    /// Normalized (uppercase) SHA256 published for this file, if any.
    pub fn sha256(&self) -> Option<String> {
        self.hashes
            .iter()
            .find(|(algo, _)| algo.eq_ignore_ascii_case("SHA256"))
            .map(|(_, hash)| hash.trim().to_uppercase())
            .filter(|hash| !hash.is_empty())
    }

    /// Local filename convention: `<stem>_<fileId><ext>`.
    pub fn local_filename(&self) -> String {
        let path = Path::new(&self.name);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name);
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_{}.{}", stem, self.id, ext),
            None => format!("{}_{}", stem, self.id),
        }
    }

    pub fn format(&self) -> Option<&str> {
        self.metadata.format.as_deref()
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size_kb.map(|kb| (kb * 1024.0).round() as u64)
    }
}
