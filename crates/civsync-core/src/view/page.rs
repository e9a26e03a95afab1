//! Page projection: cards plus pagination bounds.

use crate::model_library::{InstallStatus, PageReconciliation};
use crate::models::{CatalogPage, ModelRecord};
use crate::view::labels::card_title;
use chrono::NaiveDate;
use serde::Serialize;

/// One result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCard {
    pub model_id: u64,
    /// Name cut to card width.
    pub title: String,
    pub full_name: String,
    /// `"<name> (<id>)"`.
    pub selector: String,
    pub content_type: String,
    pub status: InstallStatus,
    /// Installed cards cannot be ticked for batch download.
    pub selectable: bool,
    pub nsfw: bool,
    pub creator: Option<String>,
    pub base_model: Option<String>,
    pub preview_url: Option<String>,
    pub published: Option<NaiveDate>,
}

impl ModelCard {
    pub fn new(record: &ModelRecord, status: InstallStatus) -> Self {
        let head = record.model_versions.first();
        Self {
            model_id: record.id,
            title: card_title(&record.name),
            full_name: record.name.clone(),
            selector: record.selector_label(),
            content_type: record.content_type.display_name().to_string(),
            status,
            selectable: status != InstallStatus::Installed,
            nsfw: record.nsfw,
            creator: record.creator_name().map(str::to_string),
            base_model: head.and_then(|v| v.base_model.clone()),
            preview_url: head.and_then(|v| v.preview_url()).map(str::to_string),
            published: head.and_then(|v| v.published_date()),
        }
    }
}

/// Cards sharing a published date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateGroup {
    pub date: Option<NaiveDate>,
    pub cards: Vec<ModelCard>,
}

/// Everything a renderer needs for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub cards: Vec<ModelCard>,
    pub current_page: u32,
    /// Highest page reached under the current filter.
    pub max_page: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub total_items: Option<u64>,
}

impl PageView {
    pub fn project(
        page: &CatalogPage,
        reconciliation: &PageReconciliation,
        current_page: u32,
        max_page: u32,
    ) -> Self {
        let cards = page
            .items
            .iter()
            .map(|record| ModelCard::new(record, reconciliation.status(record.id)))
            .collect();
        let has_link = |link: &Option<String>| link.as_deref().is_some_and(|l| !l.is_empty());

        Self {
            cards,
            current_page,
            max_page: max_page.max(current_page),
            has_prev: has_link(&page.metadata.prev_page),
            has_next: has_link(&page.metadata.next_page),
            total_items: page.metadata.total_items,
        }
    }

    /// Cards grouped by published date, newest first; undated cards last.
    /// Order within a group follows the page.
    pub fn grouped_by_date(&self) -> Vec<DateGroup> {
        let mut groups: Vec<DateGroup> = Vec::new();
        for card in &self.cards {
            match groups.iter_mut().find(|g| g.date == card.published) {
                Some(group) => group.cards.push(card.clone()),
                None => groups.push(DateGroup {
                    date: card.published,
                    cards: vec![card.clone()],
                }),
            }
        }
        // Option orders None first; reverse puts it last.
        groups.sort_by(|a, b| b.date.cmp(&a.date));
        groups
    }

    pub fn installed_count(&self) -> usize {
        self.cards
            .iter()
            .filter(|c| c.status == InstallStatus::Installed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> CatalogPage {
        serde_json::from_value(serde_json::json!({
            "items": [
                {"id": 1, "name": "A model with a really long name that overflows", "type": "Checkpoint",
                 "modelVersions": [{"id": 10, "publishedAt": "2024-01-02T00:00:00Z", "files": []}]},
                {"id": 2, "name": "B", "type": "TextualInversion",
                 "modelVersions": [{"id": 20, "publishedAt": "2024-03-01T00:00:00Z", "files": []}]},
                {"id": 3, "name": "C", "type": "LORA",
                 "modelVersions": [{"id": 30, "publishedAt": "2024-01-02T08:00:00Z", "files": []}]},
                {"id": 4, "name": "D", "type": "VAE", "modelVersions": []}
            ],
            "metadata": {"nextPage": "https://catalog.test/models?page=2", "totalItems": 40}
        }))
        .unwrap()
    }

    #[test]
    fn test_project_page() {
        let view = PageView::project(&page(), &PageReconciliation::default(), 1, 1);
        assert_eq!(view.cards.len(), 4);
        assert!(!view.has_prev);
        assert!(view.has_next);
        assert_eq!(view.total_items, Some(40));

        let first = &view.cards[0];
        assert!(first.title.ends_with("..."));
        assert_eq!(first.selector, format!("{} (1)", first.full_name));
        assert_eq!(view.cards[1].content_type, "Embedding");
        assert!(view.cards.iter().all(|c| c.selectable));
    }

    #[test]
    fn test_grouped_by_date() {
        let view = PageView::project(&page(), &PageReconciliation::default(), 2, 1);
        assert_eq!(view.max_page, 2);

        let groups = view.grouped_by_date();
        let dates: Vec<Option<NaiveDate>> = groups.iter().map(|g| g.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1),
                NaiveDate::from_ymd_opt(2024, 1, 2),
                None
            ]
        );
        let ids: Vec<u64> = groups[1].cards.iter().map(|c| c.model_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
