//! Browse session: the state behind one catalog browser.
//!
//! [`BrowseSession`] holds the page cache, last filter and the page on
//! screen. [`Browser`] carries the collaborators (catalog source, config,
//! filesystem probe) and runs every user action against a session passed in
//! by reference. Callers sharing a session across tasks wrap it in a
//! [`SharedSession`].

use crate::catalog::{
    filter_page, ids_request, link_for_direction, lookup_by_hash, plan_query,
    resolve_download_link, CatalogRequest, CivitaiClient, DynCatalogSource, Direction, HashMatch,
    Navigation, PageCache, QueryPlan,
};
use crate::config::BrowserConfig;
use crate::model_library::{
    list_subfolders, FolderQuery, FolderResolver, FsProbe, ModelInstallReport, PathProbe,
    Reconciler,
};
use crate::models::{
    CatalogFilter, CatalogPage, ContentType, ModelFile, ModelRecord, ModelVersion, SearchMode,
};
use crate::view::{
    default_version, file_label, strip_installed_suffix, DownloadQueueSnapshot, FileDetailView,
    ModelDetailView, PageView,
};
use crate::{CivsyncError, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// The page currently on screen.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub number: u32,
    pub request: CatalogRequest,
    pub page: CatalogPage,
}

/// Mutable browsing state for one user.
#[derive(Debug, Default)]
pub struct BrowseSession {
    cache: PageCache,
    current: Option<LoadedPage>,
}

/// A session shared between concurrent callers.
pub type SharedSession = Arc<Mutex<BrowseSession>>;

impl BrowseSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn current(&self) -> Option<&LoadedPage> {
        self.current.as_ref()
    }

    pub fn current_page_number(&self) -> Option<u32> {
        self.current.as_ref().map(|p| p.number)
    }

    /// Forget the cache and the current page.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.current = None;
    }

    fn record(&self, model_id: u64) -> Result<&ModelRecord> {
        self.current
            .as_ref()
            .and_then(|loaded| loaded.page.items.iter().find(|r| r.id == model_id))
            .ok_or_else(|| CivsyncError::ModelNotFound {
                model_id: model_id.to_string(),
            })
    }
}

/// Which version and file a detail view shows.
///
/// Unset fields fall back to the default selection: the first version with a
/// local match (else the newest) and its primary file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailRequest<'a> {
    pub model_id: u64,
    /// Version name or selector label (an installed marker is ignored).
    pub version: Option<&'a str>,
    /// File label as produced by [`file_label`], or the remote file name.
    pub file: Option<&'a str>,
    pub custom_base: Option<&'a Path>,
}

impl<'a> DetailRequest<'a> {
    pub fn new(model_id: u64) -> Self {
        Self {
            model_id,
            ..Default::default()
        }
    }

    pub fn version(mut self, version: &'a str) -> Self {
        self.version = Some(version);
        self
    }

    pub fn file(mut self, file: &'a str) -> Self {
        self.file = Some(file);
        self
    }

    pub fn custom_base(mut self, base: Option<&'a Path>) -> Self {
        self.custom_base = base;
        self
    }
}

/// What an empty result set means for the query that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupKind {
    Search,
    ModelId(u64),
}

/// Runs catalog actions against a [`BrowseSession`].
pub struct Browser {
    source: DynCatalogSource,
    config: BrowserConfig,
    probe: Arc<dyn PathProbe>,
}

impl Browser {
    pub fn new(source: DynCatalogSource, config: BrowserConfig) -> Self {
        Self {
            source,
            config,
            probe: Arc::new(FsProbe),
        }
    }

    /// Browser backed by the public REST API described by `config.network`.
    pub fn from_config(config: BrowserConfig) -> Result<Self> {
        let client = CivitaiClient::new(&config.network)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn with_probe(mut self, probe: Arc<dyn PathProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    fn resolver(&self) -> FolderResolver<'_> {
        FolderResolver::new(&self.config, self.probe.as_ref())
    }

    /// Run a search for `filter` and show its first page.
    ///
    /// A filter different from the last one resets the page cache before
    /// anything is fetched, so a failed search still leaves the session on
    /// the new filter with nothing on screen. Repeating the same filter keeps
    /// every page reached so far.
    pub async fn search(
        &self,
        session: &mut BrowseSession,
        filter: &CatalogFilter,
    ) -> Result<PageView> {
        let api_base = self.source.api_base();
        let plan = plan_query(api_base, filter);

        if session.cache.reset_for(filter) {
            debug!("Search started under a new filter");
            session.current = None;
        }

        let (request, page, kind) = match plan {
            QueryPlan::HashLookup { hash } => {
                let found = lookup_by_hash(self.source.as_ref(), &hash).await?;
                let model_id = found.model.id;
                let request = ids_request(api_base, model_id, filter.nsfw);
                session.cache.begin(filter, request.clone());
                let page = CatalogPage {
                    items: vec![found.model],
                    ..Default::default()
                };
                (request, page, LookupKind::ModelId(model_id))
            }
            QueryPlan::ResolveDownloadLink { version_id, nsfw } => {
                let (model_id, request) =
                    resolve_download_link(self.source.as_ref(), version_id, nsfw).await?;
                session.cache.begin(filter, request.clone());
                let page = self.source.fetch_page(&request).await?;
                (request, page, LookupKind::ModelId(model_id))
            }
            QueryPlan::ModelLookup { model_id, request } => {
                session.cache.begin(filter, request.clone());
                let page = self.source.fetch_page(&request).await?;
                (request, page, LookupKind::ModelId(model_id))
            }
            QueryPlan::Request(request) => {
                session.cache.begin(filter, request.clone());
                let page = self.source.fetch_page(&request).await?;
                (request, page, LookupKind::Search)
            }
        };

        let page = self.visible(page);
        if page.items.is_empty() {
            return Err(empty_result_error(filter, kind));
        }

        Ok(self.load(session, 1, request, page, Navigation::Fresh))
    }

    /// Follow the next link of the page on screen.
    pub async fn next_page(&self, session: &mut BrowseSession) -> Result<PageView> {
        self.step(session, Direction::Next).await
    }

    /// Follow the previous link of the page on screen.
    pub async fn previous_page(&self, session: &mut BrowseSession) -> Result<PageView> {
        self.step(session, Direction::Previous).await
    }

    async fn step(&self, session: &mut BrowseSession, direction: Direction) -> Result<PageView> {
        let current = session
            .current
            .as_ref()
            .ok_or(CivsyncError::NoSuchPage { page: 1 })?;
        let target = direction.step(current.number);
        if direction == Direction::Previous && current.number == 1 {
            return Err(CivsyncError::NoSuchPage { page: 0 });
        }

        let request = link_for_direction(&current.page.metadata, direction, target)?;
        let page = self.source.fetch_page(&request).await?;
        let page = self.visible(page);
        Ok(self.load(
            session,
            target,
            request,
            page,
            Navigation::Sequential(direction),
        ))
    }

    /// Re-fetch a page already reached under the current filter.
    pub async fn jump_to_page(&self, session: &mut BrowseSession, page: u32) -> Result<PageView> {
        let request = session.cache.request_for_page(page)?.clone();
        let fetched = self.source.fetch_page(&request).await?;
        let fetched = self.visible(fetched);
        Ok(self.load(session, page, request, fetched, Navigation::Jump))
    }

    /// Re-reconcile the page on screen without touching the network.
    pub fn refresh(&self, session: &BrowseSession) -> Result<PageView> {
        let current = session
            .current
            .as_ref()
            .ok_or(CivsyncError::NoSuchPage { page: 1 })?;
        let reconciliation = Reconciler::new(&self.resolver()).reconcile_page(&current.page);
        Ok(PageView::project(
            &current.page,
            &reconciliation,
            current.number,
            session.cache.max_page(),
        ))
    }

    /// Detail panel for a model on the current page.
    pub fn model_detail(
        &self,
        session: &BrowseSession,
        request: DetailRequest<'_>,
        queue: &DownloadQueueSnapshot,
    ) -> Result<ModelDetailView> {
        let record = session.record(request.model_id)?;
        let resolver = self.resolver();
        let reconciler = Reconciler::new(&resolver);
        let report = reconciler.reconcile_record(record);

        let version = select_version(record, &report, request.version)?;
        let file = select_file(version, request.file)?;
        let file_view = self.project_file(&reconciler, record, version, file, &request, queue)?;
        Ok(ModelDetailView::project(record, &report, version, file_view))
    }

    /// Detail for one file of a model on the current page.
    pub fn file_detail(
        &self,
        session: &BrowseSession,
        request: DetailRequest<'_>,
        queue: &DownloadQueueSnapshot,
    ) -> Result<FileDetailView> {
        let record = session.record(request.model_id)?;
        let resolver = self.resolver();
        let reconciler = Reconciler::new(&resolver);
        let report = reconciler.reconcile_record(record);

        let version = select_version(record, &report, request.version)?;
        let file = select_file(version, request.file)?;
        self.project_file(&reconciler, record, version, file, &request, queue)
    }

    fn project_file(
        &self,
        reconciler: &Reconciler<'_>,
        record: &ModelRecord,
        version: &ModelVersion,
        file: &ModelFile,
        request: &DetailRequest<'_>,
        queue: &DownloadQueueSnapshot,
    ) -> Result<FileDetailView> {
        let location = reconciler.locate_file(record, version, file, request.custom_base)?;
        debug!(
            "File {} installed: {} ({})",
            file.name,
            location.installed,
            location.folder.display()
        );
        Ok(FileDetailView::project(record, version, file, &location, queue))
    }

    /// Content-hash lookup outside of any session.
    pub async fn lookup_hash(&self, hash: &str) -> Result<HashMatch> {
        lookup_by_hash(self.source.as_ref(), hash).await
    }

    /// Directory a category installs into.
    pub fn resolve_folder(
        &self,
        content_type: ContentType,
        description: Option<&str>,
        custom_base: Option<&Path>,
    ) -> Result<PathBuf> {
        self.resolver()
            .resolve(
                FolderQuery::new(content_type)
                    .with_description(description)
                    .with_custom_base(custom_base),
            )
            .ok_or_else(|| CivsyncError::UnresolvedFolder {
                content_type: content_type.to_string(),
            })
    }

    /// Sub-folders of a category's directory, `/`-prefixed.
    pub fn list_subfolders(
        &self,
        content_type: ContentType,
        description: Option<&str>,
        custom_base: Option<&Path>,
    ) -> Result<Vec<String>> {
        let folder = self.resolve_folder(content_type, description, custom_base)?;
        Ok(list_subfolders(&folder, self.config.hide_dot_subfolders))
    }

    /// Same as [`Browser::search`] on a shared session.
    pub async fn search_shared(
        &self,
        session: &SharedSession,
        filter: &CatalogFilter,
    ) -> Result<PageView> {
        let mut guard = session.lock().await;
        self.search(&mut guard, filter).await
    }

    /// Same as [`Browser::next_page`] on a shared session.
    pub async fn next_page_shared(&self, session: &SharedSession) -> Result<PageView> {
        let mut guard = session.lock().await;
        self.next_page(&mut guard).await
    }

    /// Same as [`Browser::previous_page`] on a shared session.
    pub async fn previous_page_shared(&self, session: &SharedSession) -> Result<PageView> {
        let mut guard = session.lock().await;
        self.previous_page(&mut guard).await
    }

    /// Same as [`Browser::jump_to_page`] on a shared session.
    pub async fn jump_to_page_shared(&self, session: &SharedSession, page: u32) -> Result<PageView> {
        let mut guard = session.lock().await;
        self.jump_to_page(&mut guard, page).await
    }

    /// Same as [`Browser::refresh`] on a shared session.
    pub async fn refresh_shared(&self, session: &SharedSession) -> Result<PageView> {
        let guard = session.lock().await;
        self.refresh(&guard)
    }

    fn visible(&self, mut page: CatalogPage) -> CatalogPage {
        filter_page(&mut page, self.config.hide_early_access, Utc::now());
        page
    }

    fn load(
        &self,
        session: &mut BrowseSession,
        number: u32,
        request: CatalogRequest,
        mut page: CatalogPage,
        navigation: Navigation,
    ) -> PageView {
        session
            .cache
            .record_page(number, &request, &mut page.metadata, navigation);

        let reconciliation = Reconciler::new(&self.resolver()).reconcile_page(&page);
        let view = PageView::project(&page, &reconciliation, number, session.cache.max_page());
        info!(
            "Showing page {} of {} known ({} models, {} installed)",
            number,
            view.max_page,
            view.cards.len(),
            view.installed_count()
        );

        session.current = Some(LoadedPage {
            number,
            request,
            page,
        });
        view
    }
}

fn empty_result_error(filter: &CatalogFilter, kind: LookupKind) -> CivsyncError {
    match (kind, filter.search_mode, filter.trimmed_search()) {
        (LookupKind::ModelId(id), _, _) => CivsyncError::ModelNotFound {
            model_id: id.to_string(),
        },
        (LookupKind::Search, SearchMode::UserName, Some(username)) => CivsyncError::UserNotFound {
            username: username.to_string(),
        },
        _ => CivsyncError::NoItems,
    }
}

fn select_version<'r>(
    record: &'r ModelRecord,
    report: &ModelInstallReport,
    selector: Option<&str>,
) -> Result<&'r ModelVersion> {
    let version = match selector {
        Some(label) => record.version_by_name(strip_installed_suffix(label)),
        None => default_version(record, report),
    };
    version.ok_or_else(|| CivsyncError::Validation {
        field: "version".to_string(),
        message: format!(
            "No version {} on model {}",
            selector.unwrap_or("(default)"),
            record.id
        ),
    })
}

fn select_file<'v>(version: &'v ModelVersion, selector: Option<&str>) -> Result<&'v ModelFile> {
    let file = match selector {
        Some(wanted) => version
            .files
            .iter()
            .find(|f| file_label(f) == wanted || f.name == wanted),
        None => version.primary_file(),
    };
    file.ok_or_else(|| CivsyncError::Validation {
        field: "file".to_string(),
        message: format!(
            "No file {} on version {}",
            selector.unwrap_or("(primary)"),
            version.name
        ),
    })
}
