//! Detail projection for one model, version and file.

use crate::metadata::read_optional;
use crate::model_library::{FileLocation, InstallStatus, ModelInstallReport};
use crate::models::{ModelFile, ModelRecord, ModelVersion};
use crate::view::labels::{clean_trained_words, file_label, version_label};
use crate::{CivsyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of the download queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedDownload {
    pub model_id: u64,
    pub version_name: String,
}

/// Read-only view of the download queue, first entry in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQueueSnapshot {
    #[serde(default)]
    pub entries: Vec<QueuedDownload>,
    #[serde(default)]
    pub is_downloading: bool,
}

impl DownloadQueueSnapshot {
    /// Read a snapshot written by the download manager.
    ///
    /// A missing file is an empty queue.
    pub fn load(path: &Path) -> Result<Self> {
        let Some(contents) = read_optional(path)? else {
            return Ok(Self::default());
        };
        serde_json::from_str(&contents).map_err(|e| CivsyncError::Config {
            message: format!("Invalid queue snapshot {}: {}", path.display(), e),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The item currently being transferred.
    pub fn current(&self) -> Option<&QueuedDownload> {
        if self.is_downloading {
            self.entries.first()
        } else {
            None
        }
    }

    pub fn contains_version(&self, model_id: u64, version_name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.model_id == model_id && e.version_name == version_name)
    }
}

/// Install and delete button state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionState {
    pub install_enabled: bool,
    pub install_label: String,
    pub delete_enabled: bool,
    /// The exact version already waits in the queue.
    pub queued: bool,
}

impl ActionState {
    pub const DOWNLOAD_LABEL: &'static str = "Download model";
    pub const ENQUEUE_LABEL: &'static str = "Add to queue";
    pub const QUEUED_LABEL: &'static str = "Queued";

    pub fn new(
        installed: bool,
        model_id: u64,
        version_name: &str,
        queue: &DownloadQueueSnapshot,
    ) -> Self {
        let queued = queue.contains_version(model_id, version_name);
        let busy_with_model = queue
            .current()
            .map(|item| item.model_id == model_id)
            .unwrap_or(false);

        let install_label = if queued {
            Self::QUEUED_LABEL
        } else if queue.is_empty() {
            Self::DOWNLOAD_LABEL
        } else {
            Self::ENQUEUE_LABEL
        };

        Self {
            install_enabled: !installed && !queued,
            install_label: install_label.to_string(),
            delete_enabled: installed && !busy_with_model,
            queued,
        }
    }
}

/// The selected file of a version and where it lives locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetailView {
    pub file_id: u64,
    pub file_name: String,
    pub label: String,
    /// Labels of every file of the version, in remote order.
    pub file_labels: Vec<String>,
    pub sha256: Option<String>,
    pub installed: bool,
    pub folder: PathBuf,
    pub install_path: PathBuf,
    pub relative_subfolder: Option<String>,
    pub suggested_filename: String,
    pub download_url: Option<String>,
    pub actions: ActionState,
}

impl FileDetailView {
    pub fn project(
        record: &ModelRecord,
        version: &ModelVersion,
        file: &ModelFile,
        location: &FileLocation,
        queue: &DownloadQueueSnapshot,
    ) -> Self {
        Self {
            file_id: file.id,
            file_name: file.name.clone(),
            label: file_label(file),
            file_labels: version.files.iter().map(file_label).collect(),
            sha256: file.sha256(),
            installed: location.installed,
            folder: location.folder.clone(),
            install_path: location.install_path.clone(),
            relative_subfolder: location.relative_subfolder.clone(),
            suggested_filename: location.suggested_filename.clone(),
            download_url: file
                .download_url
                .clone()
                .or_else(|| version.download_url.clone()),
            actions: ActionState::new(location.installed, record.id, &version.name, queue),
        }
    }
}

/// Full detail panel for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetailView {
    pub model_id: u64,
    pub name: String,
    pub selector: String,
    pub content_type: String,
    pub status: InstallStatus,
    pub creator: Option<String>,
    pub tags: Vec<String>,
    pub description: String,
    /// Version selector labels; present versions carry the installed marker.
    pub version_labels: Vec<String>,
    pub selected_version_id: u64,
    pub selected_version_label: String,
    pub base_model: Option<String>,
    pub trained_words: String,
    pub file: FileDetailView,
}

impl ModelDetailView {
    pub fn project(
        record: &ModelRecord,
        report: &ModelInstallReport,
        version: &ModelVersion,
        file: FileDetailView,
    ) -> Self {
        let version_labels = record
            .model_versions
            .iter()
            .map(|v| version_label(&v.name, report.version_present(v.id)))
            .collect();

        Self {
            model_id: record.id,
            name: record.name.clone(),
            selector: record.selector_label(),
            content_type: record.content_type.display_name().to_string(),
            status: report.status,
            creator: record.creator_name().map(str::to_string),
            tags: record.tags.clone(),
            description: record.description_text().to_string(),
            version_labels,
            selected_version_id: version.id,
            selected_version_label: version_label(&version.name, report.version_present(version.id)),
            base_model: version.base_model.clone(),
            trained_words: clean_trained_words(&version.trained_words),
            file,
        }
    }
}

/// Version shown by default: the first one with a local match, else the newest.
pub fn default_version<'r>(
    record: &'r ModelRecord,
    report: &ModelInstallReport,
) -> Option<&'r ModelVersion> {
    report
        .first_present_version()
        .and_then(|id| record.version(id))
        .or_else(|| record.model_versions.first())
}
