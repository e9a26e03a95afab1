//! Installation reconciliation.
//!
//! Matches remote version/file records against files present under the
//! resolved folders. Two independent signals count as a match:
//! - filename: the `<stem>_<fileId><ext>` convention, case-insensitive
//! - hash: any `.json` sidecar whose `sha256` equals the file's published hash
//!
//! The local index is rebuilt on every call and never cached.

use crate::config::CatalogConfig;
use crate::metadata::{is_sidecar, read_sidecar_hash};
use crate::model_library::folders::{FolderQuery, FolderResolver};
use crate::model_library::naming::cleaned_name;
use crate::models::{CatalogPage, ContentType, ModelFile, ModelRecord, ModelVersion};
use crate::{CivsyncError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Filenames and sidecar hashes present under a set of folders.
#[derive(Debug, Clone, Default)]
pub struct LocalFileIndex {
    filenames: HashSet<String>,
    hashes: HashSet<String>,
    corrupt_sidecars: usize,
}

impl LocalFileIndex {
    /// Index one folder recursively, following symlinks.
    ///
    /// A missing folder yields an empty index. Malformed sidecars are logged
    /// and skipped.
    pub fn scan(folder: &Path) -> Self {
        let mut index = Self::default();
        index.add_folder(folder);
        index
    }

    /// Index several folders into one set.
    pub fn scan_all<'p, I>(folders: I) -> Self
    where
        I: IntoIterator<Item = &'p Path>,
    {
        let mut index = Self::default();
        for folder in folders {
            index.add_folder(folder);
        }
        index
    }

    fn add_folder(&mut self, folder: &Path) {
        if !folder.exists() {
            debug!("Skipping missing folder {}", folder.display());
            return;
        }

        for entry in WalkDir::new(folder).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", folder.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            self.filenames.insert(name);

            if is_sidecar(entry.path()) {
                match read_sidecar_hash(entry.path()) {
                    Ok(Some(hash)) => {
                        self.hashes.insert(hash);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("{}", e);
                        self.corrupt_sidecars += 1;
                    }
                }
            }
        }
    }

    pub fn contains_filename(&self, name: &str) -> bool {
        self.filenames.contains(&name.to_lowercase())
    }

    pub fn contains_hash(&self, hash: &str) -> bool {
        self.hashes.contains(&hash.to_uppercase())
    }

    /// Which signals, if any, match a catalog file.
    pub fn match_file(&self, file: &ModelFile) -> Option<MatchSignal> {
        let by_name = self.contains_filename(&file.local_filename());
        let by_hash = file
            .sha256()
            .map(|hash| self.hashes.contains(&hash))
            .unwrap_or(false);
        MatchSignal::from_flags(by_name, by_hash)
    }

    pub fn file_count(&self) -> usize {
        self.filenames.len()
    }

    pub fn hash_count(&self) -> usize {
        self.hashes.len()
    }

    /// Sidecars that could not be parsed during the scan.
    pub fn corrupt_sidecars(&self) -> usize {
        self.corrupt_sidecars
    }
}

/// Evidence behind a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSignal {
    Filename,
    Hash,
    Both,
}

impl MatchSignal {
    fn from_flags(by_name: bool, by_hash: bool) -> Option<Self> {
        match (by_name, by_hash) {
            (true, true) => Some(MatchSignal::Both),
            (true, false) => Some(MatchSignal::Filename),
            (false, true) => Some(MatchSignal::Hash),
            (false, false) => None,
        }
    }
}

/// Install state of a version or a whole model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    #[default]
    NotInstalled,
    /// The newest version is present.
    Installed,
    /// Only an older version is present.
    Outdated,
}

/// Reconciliation result for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStatus {
    pub version_id: u64,
    pub status: InstallStatus,
    /// Ids of the files that matched, in remote order.
    pub matched_files: Vec<u64>,
}

/// Reconciliation result for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInstallReport {
    pub model_id: u64,
    pub status: InstallStatus,
    pub versions: Vec<VersionStatus>,
}

impl ModelInstallReport {
    pub fn version_status(&self, version_id: u64) -> InstallStatus {
        self.versions
            .iter()
            .find(|v| v.version_id == version_id)
            .map(|v| v.status)
            .unwrap_or_default()
    }

    /// Whether any local match exists for this version.
    pub fn version_present(&self, version_id: u64) -> bool {
        self.version_status(version_id) != InstallStatus::NotInstalled
    }

    /// First version in remote order with a local match.
    pub fn first_present_version(&self) -> Option<u64> {
        self.versions
            .iter()
            .find(|v| v.status != InstallStatus::NotInstalled)
            .map(|v| v.version_id)
    }
}

/// Classify every version of a model against an index.
///
/// Only the first version in remote order can be `Installed`; any other
/// matching version is `Outdated`. The model takes the status of its best
/// version.
pub fn classify_model(record: &ModelRecord, index: &LocalFileIndex) -> ModelInstallReport {
    let versions: Vec<VersionStatus> = record
        .model_versions
        .iter()
        .enumerate()
        .map(|(position, version)| {
            let matched_files: Vec<u64> = version
                .files
                .iter()
                .filter(|file| index.match_file(file).is_some())
                .map(|file| file.id)
                .collect();
            let status = match (matched_files.is_empty(), position) {
                (true, _) => InstallStatus::NotInstalled,
                (false, 0) => InstallStatus::Installed,
                (false, _) => InstallStatus::Outdated,
            };
            VersionStatus {
                version_id: version.id,
                status,
                matched_files,
            }
        })
        .collect();

    let status = if versions
        .first()
        .map(|v| v.status == InstallStatus::Installed)
        .unwrap_or(false)
    {
        InstallStatus::Installed
    } else if versions.iter().any(|v| v.status == InstallStatus::Outdated) {
        InstallStatus::Outdated
    } else {
        InstallStatus::NotInstalled
    };

    ModelInstallReport {
        model_id: record.id,
        status,
        versions,
    }
}

/// Install reports for every record of a page.
#[derive(Debug, Clone, Default)]
pub struct PageReconciliation {
    reports: HashMap<u64, ModelInstallReport>,
}

impl PageReconciliation {
    pub fn report(&self, model_id: u64) -> Option<&ModelInstallReport> {
        self.reports.get(&model_id)
    }

    pub fn status(&self, model_id: u64) -> InstallStatus {
        self.report(model_id).map(|r| r.status).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Where a selected file lives, or would be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub installed: bool,
    pub signal: Option<MatchSignal>,
    /// Resolved category folder.
    pub base_folder: PathBuf,
    /// Directory holding the match, or the base folder when unmatched.
    pub folder: PathBuf,
    /// Suggested install directory (base plus default sub-folder when unmatched).
    pub install_path: PathBuf,
    /// `/`-prefixed path of `folder` relative to the base, or the configured
    /// default sub-folder when unmatched. `None` for a match directly in the base.
    pub relative_subfolder: Option<String>,
    /// Filename a download should be saved under.
    pub suggested_filename: String,
}

/// Reconciles catalog records against the local store.
pub struct Reconciler<'a> {
    resolver: &'a FolderResolver<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(resolver: &'a FolderResolver<'a>) -> Self {
        Self { resolver }
    }

    fn record_folder(&self, record: &ModelRecord) -> Option<PathBuf> {
        self.resolver.resolve(
            FolderQuery::new(record.content_type).with_description(record.description.as_deref()),
        )
    }

    /// Reconcile a whole page.
    ///
    /// One index is built over the union of every record's folder, so a
    /// sidecar anywhere in those folders can match any record.
    pub fn reconcile_page(&self, page: &CatalogPage) -> PageReconciliation {
        let folders: BTreeSet<PathBuf> = page
            .items
            .iter()
            .filter_map(|record| self.record_folder(record))
            .collect();
        let index = LocalFileIndex::scan_all(folders.iter().map(PathBuf::as_path));
        debug!(
            "Indexed {} files and {} hashes across {} folders",
            index.file_count(),
            index.hash_count(),
            folders.len()
        );

        let reports = page
            .items
            .iter()
            .map(|record| (record.id, classify_model(record, &index)))
            .collect();
        PageReconciliation { reports }
    }

    /// Reconcile a single record against its own folder.
    pub fn reconcile_record(&self, record: &ModelRecord) -> ModelInstallReport {
        let index = match self.record_folder(record) {
            Some(folder) => LocalFileIndex::scan(&folder),
            None => LocalFileIndex::default(),
        };
        classify_model(record, &index)
    }

    /// Folder a file belongs in, applying the embedding redirect.
    pub fn base_folder_for(
        &self,
        record: &ModelRecord,
        version: &ModelVersion,
        file: &ModelFile,
        custom_base: Option<&Path>,
    ) -> Result<PathBuf> {
        let content_type = if is_embedding_file(record, version, file) {
            debug!("Treating {} as an embedding", file.name);
            ContentType::TextualInversion
        } else {
            record.content_type
        };

        self.resolver
            .resolve(
                FolderQuery::new(content_type)
                    .with_description(record.description.as_deref())
                    .with_custom_base(custom_base),
            )
            .ok_or_else(|| CivsyncError::UnresolvedFolder {
                content_type: content_type.to_string(),
            })
    }

    /// Find where a file is installed, or where it would go.
    pub fn locate_file(
        &self,
        record: &ModelRecord,
        version: &ModelVersion,
        file: &ModelFile,
        custom_base: Option<&Path>,
    ) -> Result<FileLocation> {
        let base_folder = self.base_folder_for(record, version, file, custom_base)?;
        let found = find_in_folder(&base_folder, file);
        let suggested_filename = cleaned_name(&file.local_filename());

        let location = match found {
            Some((folder, signal)) => {
                let relative = relative_subfolder(&base_folder, &folder);
                FileLocation {
                    installed: true,
                    signal: Some(signal),
                    install_path: folder.clone(),
                    folder,
                    base_folder,
                    relative_subfolder: relative,
                    suggested_filename,
                }
            }
            None => {
                let default_sub = self
                    .resolver
                    .default_subfolder(record.content_type, record.description.as_deref());
                let install_path = match &default_sub {
                    Some(sub) => base_folder.join(sub.trim_start_matches(['/', '\\'])),
                    None => base_folder.clone(),
                };
                FileLocation {
                    installed: false,
                    signal: None,
                    folder: base_folder.clone(),
                    install_path,
                    base_folder,
                    relative_subfolder: default_sub,
                    suggested_filename,
                }
            }
        };
        Ok(location)
    }
}

/// LORA versions that ship both SafeTensor and PickleTensor files carry a
/// small PickleTensor embedding next to the LoRA.
pub fn is_embedding_file(record: &ModelRecord, version: &ModelVersion, file: &ModelFile) -> bool {
    if record.content_type != ContentType::Lora {
        return false;
    }
    let has_format = |wanted: &str| {
        version
            .files
            .iter()
            .any(|f| f.format().map(|fmt| fmt.contains(wanted)).unwrap_or(false))
    };
    let is_pickle = file
        .format()
        .map(|fmt| fmt.contains("PickleTensor"))
        .unwrap_or(false);

    has_format("SafeTensor")
        && has_format("PickleTensor")
        && is_pickle
        && file.size_kb.unwrap_or(0.0) <= CatalogConfig::EMBEDDING_MAX_SIZE_KB
}

/// Walk a folder for the first entry matching a file, in sorted walk order.
fn find_in_folder(base: &Path, file: &ModelFile) -> Option<(PathBuf, MatchSignal)> {
    if !base.exists() {
        return None;
    }

    let convention = file.local_filename().to_lowercase();
    let cleaned = cleaned_name(&file.local_filename()).to_lowercase();
    let hash = file.sha256();

    for entry in WalkDir::new(base)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let parent = entry.path().parent().unwrap_or(base).to_path_buf();

        if let Some(hash) = &hash {
            if is_sidecar(entry.path()) {
                match read_sidecar_hash(entry.path()) {
                    Ok(Some(found)) if &found == hash => return Some((parent, MatchSignal::Hash)),
                    Ok(_) => {}
                    Err(e) => warn!("{}", e),
                }
            }
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name == convention || name == cleaned {
            return Some((parent, MatchSignal::Filename));
        }
    }
    None
}

/// `/`-prefixed relative path, or `None` for the base itself.
fn relative_subfolder(base: &Path, folder: &Path) -> Option<String> {
    let relative = folder.strip_prefix(base).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(format!("/{}", joined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrowserConfig;
    use crate::model_library::folders::FsProbe;
    use std::fs;
    use tempfile::TempDir;

    const HASH_A: &str = "ab";

    fn file(id: u64, name: &str, hash: Option<&str>) -> ModelFile {
        let mut value = serde_json::json!({"id": id, "name": name});
        if let Some(hash) = hash {
            value["hashes"] = serde_json::json!({"SHA256": hash});
        }
        serde_json::from_value(value).unwrap()
    }

    fn version(id: u64, files: Vec<ModelFile>) -> ModelVersion {
        let mut version: ModelVersion = serde_json::from_value(serde_json::json!({"id": id})).unwrap();
        version.files = files;
        version
    }

    fn record(id: u64, content_type: ContentType, versions: Vec<ModelVersion>) -> ModelRecord {
        let mut record: ModelRecord = serde_json::from_value(serde_json::json!({
            "id": id, "name": "model", "type": "Checkpoint"
        }))
        .unwrap();
        record.content_type = content_type;
        record.model_versions = versions;
        record
    }

    fn full_hash(prefix: &str) -> String {
        format!("{:0<64}", prefix.to_uppercase())
    }

    #[test]
    fn test_index_collects_names_and_hashes() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("nested");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("Model_7.SafeTensors"), b"").unwrap();
        fs::write(sub.join("model_7.json"), r#"{"sha256": "abc"}"#).unwrap();

        let index = LocalFileIndex::scan(temp_dir.path());
        assert!(index.contains_filename("model_7.safetensors"));
        assert!(index.contains_hash("ABC"));
        assert_eq!(index.corrupt_sidecars(), 0);
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let index = LocalFileIndex::scan(&temp_dir.path().join("absent"));
        assert_eq!(index.file_count(), 0);
    }

    #[test]
    fn test_malformed_sidecar_does_not_abort() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.json"), "{not json").unwrap();
        fs::write(temp_dir.path().join("list.json"), "[1]").unwrap();
        fs::write(temp_dir.path().join("good.json"), r#"{"sha256": "ff"}"#).unwrap();

        let index = LocalFileIndex::scan(temp_dir.path());
        assert_eq!(index.corrupt_sidecars(), 2);
        assert!(index.contains_hash("FF"));
    }

    #[test]
    fn test_filename_only_and_hash_only_match() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("named_1.safetensors"), b"").unwrap();
        fs::write(
            temp_dir.path().join("other.json"),
            format!(r#"{{"sha256": "{}"}}"#, full_hash(HASH_A).to_lowercase()),
        )
        .unwrap();
        let index = LocalFileIndex::scan(temp_dir.path());

        let by_name = record(
            1,
            ContentType::Checkpoint,
            vec![version(10, vec![file(1, "named.safetensors", None)])],
        );
        let report = classify_model(&by_name, &index);
        assert_eq!(report.status, InstallStatus::Installed);

        let by_hash = record(
            2,
            ContentType::Checkpoint,
            vec![version(20, vec![file(2, "renamed.safetensors", Some(&full_hash(HASH_A)))])],
        );
        assert_eq!(classify_model(&by_hash, &index).status, InstallStatus::Installed);

        let neither = record(
            3,
            ContentType::Checkpoint,
            vec![version(30, vec![file(3, "x.safetensors", Some(&full_hash("cd")))])],
        );
        assert_eq!(
            classify_model(&neither, &index).status,
            InstallStatus::NotInstalled
        );
    }

    #[test]
    fn test_older_version_match_is_outdated() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b_2.safetensors"), b"").unwrap();
        let index = LocalFileIndex::scan(temp_dir.path());

        let model = record(
            1,
            ContentType::Lora,
            vec![
                version(100, vec![file(1, "a.safetensors", None)]),
                version(200, vec![file(2, "b.safetensors", None)]),
            ],
        );
        let report = classify_model(&model, &index);
        assert_eq!(report.version_status(100), InstallStatus::NotInstalled);
        assert_eq!(report.version_status(200), InstallStatus::Outdated);
        assert_eq!(report.status, InstallStatus::Outdated);
        assert_eq!(report.first_present_version(), Some(200));
    }

    #[test]
    fn test_head_match_wins_over_older_matches() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a_1.safetensors"), b"").unwrap();
        fs::write(temp_dir.path().join("b_2.safetensors"), b"").unwrap();
        let index = LocalFileIndex::scan(temp_dir.path());

        let model = record(
            1,
            ContentType::Lora,
            vec![
                version(100, vec![file(1, "a.safetensors", None)]),
                version(200, vec![file(2, "b.safetensors", None)]),
            ],
        );
        let report = classify_model(&model, &index);
        assert_eq!(report.status, InstallStatus::Installed);
        assert_eq!(report.version_status(200), InstallStatus::Outdated);
    }

    fn config_for(root: &Path) -> BrowserConfig {
        let mut config = BrowserConfig::default();
        config.roots.models_root = root.join("models");
        config.roots.data_root = root.to_path_buf();
        config.roots.extensions_root = root.join("extensions");
        config
    }

    #[test]
    fn test_locate_installed_in_subfolder() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(temp_dir.path());
        let target = temp_dir.path().join("models").join("Lora").join("styles");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("my lora_5.safetensors"), b"").unwrap();

        let resolver = FolderResolver::new(&config, &FsProbe);
        let reconciler = Reconciler::new(&resolver);
        let model = record(
            1,
            ContentType::Lora,
            vec![version(10, vec![file(5, "my  lora.safetensors", None)])],
        );
        let location = reconciler
            .locate_file(&model, &model.model_versions[0], &model.model_versions[0].files[0], None)
            .unwrap();

        assert!(location.installed);
        assert_eq!(location.signal, Some(MatchSignal::Filename));
        assert_eq!(location.folder, target);
        assert_eq!(location.relative_subfolder.as_deref(), Some("/styles"));
    }

    #[test]
    fn test_locate_uninstalled_uses_default_subfolder() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_for(temp_dir.path());
        config
            .default_subfolders
            .insert("Checkpoint".into(), "/SDXL".into());

        let resolver = FolderResolver::new(&config, &FsProbe);
        let reconciler = Reconciler::new(&resolver);
        let model = record(
            1,
            ContentType::Checkpoint,
            vec![version(10, vec![file(5, "base.safetensors", None)])],
        );
        let location = reconciler
            .locate_file(&model, &model.model_versions[0], &model.model_versions[0].files[0], None)
            .unwrap();

        let base = temp_dir.path().join("models").join("Stable-diffusion");
        assert!(!location.installed);
        assert_eq!(location.base_folder, base);
        assert_eq!(location.install_path, base.join("SDXL"));
        assert_eq!(location.relative_subfolder.as_deref(), Some("/SDXL"));
        assert_eq!(location.suggested_filename, "base_5.safetensors");
    }

    #[test]
    fn test_locate_by_sidecar_hash() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(temp_dir.path());
        let base = temp_dir.path().join("models").join("VAE");
        fs::create_dir_all(&base).unwrap();
        fs::write(
            base.join("renamed.json"),
            format!(r#"{{"sha256": "{}"}}"#, full_hash(HASH_A)),
        )
        .unwrap();

        let resolver = FolderResolver::new(&config, &FsProbe);
        let reconciler = Reconciler::new(&resolver);
        let model = record(
            1,
            ContentType::Vae,
            vec![version(10, vec![file(5, "vae.pt", Some(&full_hash(HASH_A)))])],
        );
        let location = reconciler
            .locate_file(&model, &model.model_versions[0], &model.model_versions[0].files[0], None)
            .unwrap();
        assert!(location.installed);
        assert_eq!(location.signal, Some(MatchSignal::Hash));
        assert_eq!(location.relative_subfolder, None);
    }

    #[test]
    fn test_unknown_type_cannot_be_located() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(temp_dir.path());
        let resolver = FolderResolver::new(&config, &FsProbe);
        let reconciler = Reconciler::new(&resolver);
        let model = record(
            1,
            ContentType::Unknown,
            vec![version(10, vec![file(5, "x.bin", None)])],
        );
        let err = reconciler
            .locate_file(&model, &model.model_versions[0], &model.model_versions[0].files[0], None)
            .unwrap_err();
        assert_eq!(err.error_kind(), "path_not_found");
        assert_eq!(reconciler.reconcile_record(&model).status, InstallStatus::NotInstalled);
    }

    #[test]
    fn test_embedding_redirect() {
        let mut safe = file(1, "style.safetensors", None);
        safe.metadata.format = Some("SafeTensor".into());
        safe.size_kb = Some(140_000.0);
        let mut pickle = file(2, "style.pt", None);
        pickle.metadata.format = Some("PickleTensor".into());
        pickle.size_kb = Some(25.0);

        let model = record(
            1,
            ContentType::Lora,
            vec![version(10, vec![pickle.clone(), safe.clone()])],
        );
        let v = &model.model_versions[0];
        assert!(is_embedding_file(&model, v, &pickle));
        assert!(!is_embedding_file(&model, v, &safe));

        let mut big = pickle.clone();
        big.size_kb = Some(150.0);
        assert!(!is_embedding_file(&model, v, &big));

        let checkpoint = record(2, ContentType::Checkpoint, model.model_versions.clone());
        assert!(!is_embedding_file(&checkpoint, v, &pickle));
    }

    #[test]
    fn test_relative_subfolder() {
        let base = Path::new("/m/Lora");
        assert_eq!(relative_subfolder(base, base), None);
        assert_eq!(
            relative_subfolder(base, Path::new("/m/Lora/a/b")),
            Some("/a/b".to_string())
        );
        assert_eq!(relative_subfolder(base, Path::new("/other")), None);
    }
}
