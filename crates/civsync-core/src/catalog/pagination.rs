//! Page cache for revisitable catalog pagination.
//!
//! Maps 1-based page numbers to the request that produced them. The map only
//! grows while the filter stays the same; any filter change resets it to the
//! first page.

use crate::catalog::query::{CatalogRequest, Direction};
use crate::models::{CatalogFilter, PageMetadata};
use crate::{CivsyncError, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// How the page being recorded was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// A new or repeated search landing on a known page.
    Fresh,
    /// Following a prev/next link from the previous page.
    Sequential(Direction),
    /// Jumping straight to an already known page.
    Jump,
}

/// Cache of page requests for the active filter.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    last_filter: Option<CatalogFilter>,
    pages: BTreeMap<u32, CatalogRequest>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first search is started.
    pub fn is_empty(&self) -> bool {
        self.last_filter.is_none()
    }

    pub fn last_filter(&self) -> Option<&CatalogFilter> {
        self.last_filter.as_ref()
    }

    /// Whether `filter` differs from the last one seen (an unset filter differs from everything).
    pub fn filter_changed(&self, filter: &CatalogFilter) -> bool {
        self.last_filter.as_ref() != Some(filter)
    }

    /// Make `filter` the active one.
    ///
    /// When it differs from the last filter the page map is emptied and
    /// `true` is returned. An unchanged filter leaves the cache as it is.
    pub fn reset_for(&mut self, filter: &CatalogFilter) -> bool {
        if !self.filter_changed(filter) {
            return false;
        }
        debug!("Filter changed, resetting page cache");
        self.pages.clear();
        self.last_filter = Some(filter.clone());
        true
    }

    /// Start a search under `filter` whose first page is `first_request`.
    ///
    /// Resets the map to `{1: first_request}` when the filter changed and
    /// returns `true`. Otherwise only the entry for page 1 is refreshed and every
    /// other reached page is kept.
    pub fn begin(&mut self, filter: &CatalogFilter, first_request: CatalogRequest) -> bool {
        let reset = self.reset_for(filter);
        self.pages.insert(1, first_request);
        reset
    }

    /// Drop everything, as on session restart.
    pub fn clear(&mut self) {
        self.last_filter = None;
        self.pages.clear();
    }

    /// The request that produced a page.
    pub fn request_for_page(&self, page: u32) -> Result<&CatalogRequest> {
        self.pages
            .get(&page)
            .ok_or(CivsyncError::NoSuchPage { page })
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Highest page number reached so far (1 when nothing is cached).
    pub fn max_page(&self) -> u32 {
        self.pages.keys().next_back().copied().unwrap_or(1)
    }

    pub fn known_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// Merge a fetched page into the cache and patch its navigation links.
    ///
    /// - A missing previous link on a page past the first is filled from the
    ///   entry for `page - 1`.
    /// - After a jump, an already known `page + 1` entry replaces the next link.
    /// - Otherwise a page seen for the first time is recorded under `page`.
    pub fn record_page(
        &mut self,
        page: u32,
        request: &CatalogRequest,
        metadata: &mut PageMetadata,
        navigation: Navigation,
    ) {
        if metadata.prev_page.is_none() && page > 1 {
            if let Some(prev) = self.pages.get(&(page - 1)) {
                metadata.prev_page = Some(prev.url.clone());
            }
        }

        if navigation == Navigation::Jump {
            if let Some(next) = self.pages.get(&(page + 1)) {
                metadata.next_page = Some(next.url.clone());
            }
        } else if !self.pages.contains_key(&page) {
            debug!("Recording page {} -> {}", page, request);
            self.pages.insert(page, request.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, SearchMode};

    fn req(page: u32) -> CatalogRequest {
        CatalogRequest::new(format!("https://catalog.test/models?page={}", page))
    }

    fn walk_to(cache: &mut PageCache, last: u32) {
        for page in 2..=last {
            let mut metadata = PageMetadata::default();
            cache.record_page(
                page,
                &req(page),
                &mut metadata,
                Navigation::Sequential(Direction::Next),
            );
        }
    }

    #[test]
    fn test_filter_change_resets() {
        let f1 = CatalogFilter::default();
        let f2 = CatalogFilter::default().with_types([ContentType::Checkpoint]);
        let mut cache = PageCache::new();

        assert!(cache.begin(&f1, req(1)));
        walk_to(&mut cache, 3);
        assert_eq!(cache.max_page(), 3);

        assert!(cache.begin(&f2, req(1)));
        assert_eq!(cache.known_pages().collect::<Vec<_>>(), vec![1]);
        assert_eq!(cache.last_filter(), Some(&f2));
    }

    #[test]
    fn test_reset_for_empties_map_without_first_page() {
        let mut cache = PageCache::new();
        cache.begin(&CatalogFilter::default(), req(1));
        walk_to(&mut cache, 2);

        let users = CatalogFilter::default().with_search(SearchMode::UserName, "ghost");
        assert!(cache.reset_for(&users));
        assert_eq!(cache.known_pages().count(), 0);
        assert_eq!(cache.last_filter(), Some(&users));
        assert_eq!(cache.max_page(), 1);
        assert!(!cache.reset_for(&users));
    }

    #[test]
    fn test_same_filter_keeps_reached_pages() {
        let filter = CatalogFilter::default().with_search(SearchMode::Tag, "anime");
        let mut cache = PageCache::new();
        cache.begin(&filter, req(1));
        walk_to(&mut cache, 4);

        for _ in 0..3 {
            assert!(!cache.begin(&filter, req(1)));
        }
        assert_eq!(cache.max_page(), 4);
        assert!(cache.contains(3));
    }

    #[test]
    fn test_unseen_page_is_error() {
        let mut cache = PageCache::new();
        assert!(matches!(
            cache.request_for_page(1),
            Err(CivsyncError::NoSuchPage { page: 1 })
        ));
        cache.begin(&CatalogFilter::default(), req(1));
        assert!(matches!(
            cache.request_for_page(7),
            Err(CivsyncError::NoSuchPage { page: 7 })
        ));
    }

    #[test]
    fn test_prev_link_backfilled() {
        let mut cache = PageCache::new();
        cache.begin(&CatalogFilter::default(), req(1));

        let mut metadata = PageMetadata::default();
        cache.record_page(
            2,
            &req(2),
            &mut metadata,
            Navigation::Sequential(Direction::Next),
        );
        assert_eq!(metadata.prev_page.as_deref(), Some(req(1).as_str()));

        let mut first = PageMetadata::default();
        cache.record_page(1, &req(1), &mut first, Navigation::Fresh);
        assert!(first.prev_page.is_none());
    }

    #[test]
    fn test_jump_preserves_known_next_link() {
        let mut cache = PageCache::new();
        cache.begin(&CatalogFilter::default(), req(1));
        walk_to(&mut cache, 3);

        let mut metadata = PageMetadata {
            next_page: Some("https://catalog.test/models?cursor=fresh".into()),
            ..Default::default()
        };
        cache.record_page(2, &req(2), &mut metadata, Navigation::Jump);
        assert_eq!(metadata.next_page.as_deref(), Some(req(3).as_str()));
    }

    #[test]
    fn test_sequential_does_not_overwrite_known_page() {
        let mut cache = PageCache::new();
        cache.begin(&CatalogFilter::default(), req(1));
        walk_to(&mut cache, 2);

        let mut metadata = PageMetadata::default();
        let other = CatalogRequest::new("https://catalog.test/models?cursor=other");
        cache.record_page(
            2,
            &other,
            &mut metadata,
            Navigation::Sequential(Direction::Previous),
        );
        assert_eq!(cache.request_for_page(2).unwrap(), &req(2));
    }
}
