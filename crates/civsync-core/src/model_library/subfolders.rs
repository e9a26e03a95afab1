//! Sub-folder listing for install location pickers.

use std::path::Path;
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Every directory below `base` as a sorted, `/`-prefixed relative path.
///
/// Dot-folders and everything beneath them are skipped when `hide_dot` is set.
/// A missing base yields an empty list.
pub fn list_subfolders(base: &Path, hide_dot: bool) -> Vec<String> {
    if !base.is_dir() {
        return Vec::new();
    }

    let mut folders: Vec<String> = WalkDir::new(base)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !(hide_dot && is_hidden(e)))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let relative = e.path().strip_prefix(base).ok()?;
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some(format!("/{}", joined))
        })
        .collect();
    folders.sort();
    folders
}
