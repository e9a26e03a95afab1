//! Optional local files.
//!
//! Settings, sidecars and queue snapshots may all be absent; callers decide
//! what a parse failure means for their own file.

use crate::{CivsyncError, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Read a file's text, or `None` when there is no such file.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CivsyncError::io_with_path(e, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(read_optional(&temp_dir.path().join("absent.json")).unwrap(), None);
    }

    #[test]
    fn test_reads_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("queue.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(read_optional(&path).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_optional(temp_dir.path()).unwrap_err();
        assert!(matches!(err, CivsyncError::Io { path: Some(_), .. }));
    }
}
