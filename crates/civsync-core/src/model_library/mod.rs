//! Local model store: where each category lives and what is installed there.

mod folders;
mod naming;
mod reconcile;
mod subfolders;

pub use folders::{FolderQuery, FolderResolver, FsProbe, PathProbe, UpscalerFamily};
pub use naming::{cleaned_name, format_selector, local_filename, parse_selector};
pub use reconcile::{
    classify_model, is_embedding_file, FileLocation, InstallStatus, LocalFileIndex, MatchSignal,
    ModelInstallReport, PageReconciliation, Reconciler, VersionStatus,
};
pub use subfolders::list_subfolders;
