//! Which versions and records a page shows.

use crate::models::{CatalogPage, ModelRecord};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Drop versions without files and, when `hide_early_access` is set,
/// versions still inside their early-access window.
///
/// Returns `false` when no version is left.
pub fn retain_visible_versions(
    record: &mut ModelRecord,
    hide_early_access: bool,
    now: DateTime<Utc>,
) -> bool {
    record.model_versions.retain(|version| {
        !version.files.is_empty() && !(hide_early_access && version.in_early_access(now))
    });
    !record.model_versions.is_empty()
}

/// Apply version visibility to every record and drop records left empty.
pub fn filter_page(page: &mut CatalogPage, hide_early_access: bool, now: DateTime<Utc>) {
    let before = page.items.len();
    page.items
        .retain_mut(|record| retain_visible_versions(record, hide_early_access, now));
    let dropped = before - page.items.len();
    if dropped > 0 {
        debug!("Dropped {} records without visible versions", dropped);
    }
}
