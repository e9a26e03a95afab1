//! civsync Core - remote model catalog browsing with local installation
//! reconciliation.
//!
//! This crate builds catalog queries from a filter, keeps a page cache so
//! paginated results can be revisited, maps each content category to a local
//! directory and marks every result as installed, outdated or missing. It has
//! no UI; the projections in [`view`] are ready for any renderer.
//!
//! # Example
//!
//! ```rust,ignore
//! use civsync_core::{BrowseSession, Browser, BrowserConfig, CatalogFilter};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> civsync_core::Result<()> {
//!     let browser = Browser::from_config(BrowserConfig::load_or_default(Path::new("civsync.json"))?)?;
//!     let mut session = BrowseSession::new();
//!
//!     let page = browser.search(&mut session, &CatalogFilter::default()).await?;
//!     println!("{} models on page {}", page.cards.len(), page.current_page);
//!
//!     let next = browser.next_page(&mut session).await?;
//!     println!("{} installed", next.installed_count());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod model_library;
pub mod models;
pub mod network;
pub mod session;
pub mod view;

// Re-export commonly used types
pub use catalog::{CatalogSource, CivitaiClient, DynCatalogSource, HashMatch, PageCache};
pub use config::{BrowserConfig, CatalogConfig, NetworkConfig};
pub use error::{CivsyncError, Result};
pub use model_library::{FolderResolver, InstallStatus, LocalFileIndex, PathProbe};
pub use models::{CatalogFilter, ContentType, ModelFile, ModelRecord, ModelVersion, SearchMode};
pub use session::{BrowseSession, Browser, DetailRequest, SharedSession};
pub use view::{DownloadQueueSnapshot, ModelDetailView, PageView};
