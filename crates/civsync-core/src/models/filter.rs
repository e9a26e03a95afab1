//! Search filter snapshot.

use crate::config::CatalogConfig;
use crate::models::ContentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Result ordering offered by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortMode {
    Newest,
    Oldest,
    MostDownloaded,
    #[default]
    HighestRated,
    MostLiked,
    MostBuzz,
    MostDiscussed,
    MostCollected,
    MostImages,
}

impl SortMode {
    pub const ALL: [SortMode; 9] = [
        SortMode::Newest,
        SortMode::Oldest,
        SortMode::MostDownloaded,
        SortMode::HighestRated,
        SortMode::MostLiked,
        SortMode::MostBuzz,
        SortMode::MostDiscussed,
        SortMode::MostCollected,
        SortMode::MostImages,
    ];

    /// Value sent as the `sort` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Newest => "Newest",
            SortMode::Oldest => "Oldest",
            SortMode::MostDownloaded => "Most Downloaded",
            SortMode::HighestRated => "Highest Rated",
            SortMode::MostLiked => "Most Liked",
            SortMode::MostBuzz => "Most Buzz",
            SortMode::MostDiscussed => "Most Discussed",
            SortMode::MostCollected => "Most Collected",
            SortMode::MostImages => "Most Images",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL.into_iter().find(|mode| {
            mode.as_str()
                .replace(' ', "")
                .eq_ignore_ascii_case(&wanted)
        })
    }
}

/// Time window the sort applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    AllTime,
    Year,
    #[default]
    Month,
    Week,
    Day,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::AllTime,
        Period::Year,
        Period::Month,
        Period::Week,
        Period::Day,
    ];

    /// Label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Period::AllTime => "All Time",
            Period::Year => "Year",
            Period::Month => "Month",
            Period::Week => "Week",
            Period::Day => "Day",
        }
    }

    /// Value sent as the `period` query parameter (label without spaces).
    pub fn as_param(&self) -> &'static str {
        match self {
            Period::AllTime => "AllTime",
            other => other.label(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|period| period.as_param().eq_ignore_ascii_case(&wanted))
    }
}

/// How the search text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// Free text; pasted catalog URLs turn into id lookups.
    #[default]
    ModelName,
    UserName,
    Tag,
    /// Content hash lookup; bypasses the page cache.
    Sha256,
}

impl SearchMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '_', '-'], "").as_str() {
            "modelname" | "model" | "query" => Some(SearchMode::ModelName),
            "username" | "user" => Some(SearchMode::UserName),
            "tag" => Some(SearchMode::Tag),
            "sha256" | "hash" => Some(SearchMode::Sha256),
            _ => None,
        }
    }
}

/// Immutable snapshot of everything that shapes a catalog query.
///
/// Two filters are equal iff every field matches. A change in any field
/// invalidates the page cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub content_types: BTreeSet<ContentType>,
    pub sort: SortMode,
    pub period: Period,
    pub search_mode: SearchMode,
    pub search_text: String,
    pub base_models: BTreeSet<String>,
    pub favorites_only: bool,
    pub nsfw: bool,
    pub page_size: u32,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            content_types: BTreeSet::new(),
            sort: SortMode::default(),
            period: Period::default(),
            search_mode: SearchMode::default(),
            search_text: String::new(),
            base_models: BTreeSet::new(),
            favorites_only: false,
            nsfw: false,
            page_size: CatalogConfig::DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogFilter {
    /// Search text with surrounding whitespace removed, if any remains.
    pub fn trimmed_search(&self) -> Option<&str> {
        let text = self.search_text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Page size clamped to what the catalog accepts.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, CatalogConfig::MAX_PAGE_SIZE)
    }

    pub fn with_search(mut self, mode: SearchMode, text: impl Into<String>) -> Self {
        self.search_mode = mode;
        self.search_text = text.into();
        self
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = ContentType>) -> Self {
        self.content_types = types.into_iter().collect();
        self
    }
}
