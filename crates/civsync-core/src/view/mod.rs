//! UI-ready projections of pages, models and files.
//!
//! Everything here is a pure function of catalog records, reconciliation
//! results and a download-queue snapshot.

mod detail;
mod labels;
mod page;

pub use detail::{
    default_version, ActionState, DownloadQueueSnapshot, FileDetailView, ModelDetailView,
    QueuedDownload,
};
pub use labels::{
    card_title, clean_trained_words, file_label, human_size, strip_installed_suffix,
    version_label, INSTALLED_SUFFIX,
};
pub use page::{DateGroup, ModelCard, PageView};
