//! Local filename conventions and selector strings.
//!
//! Installed files are named `<stem>_<fileId><ext>` so a catalog file can be
//! recognized without hashing. Users may also save files under a cleaned
//! version of the original name; detail lookups accept both.

use crate::models::ModelFile;
use regex::Regex;
use std::sync::LazyLock;

/// Characters reserved on NTFS that must be removed.
#[cfg(windows)]
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

#[cfg(not(windows))]
const ILLEGAL_FILENAME_CHARS: &[char] = &['/'];

/// Regex for runs of whitespace.
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Convention filename for a catalog file.
pub fn local_filename(file: &ModelFile) -> String {
    file.local_filename()
}

/// Strip path-illegal characters and collapse whitespace in the stem,
/// keeping the extension untouched.
///
/// # Examples
///
/// ```
/// use civsync_core::model_library::cleaned_name;
///
/// assert_eq!(cleaned_name("  my   model .safetensors"), "my model.safetensors");
/// assert_eq!(cleaned_name("a/b.ckpt"), "ab.ckpt");
/// ```
pub fn cleaned_name(file_name: &str) -> String {
    let (stem, extension) = split_extension(file_name);
    let stripped: String = stem
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c))
        .collect();
    let collapsed = WHITESPACE_RUN.replace_all(stripped.trim(), " ");
    format!("{}{}", collapsed, extension)
}

/// Split at the last dot of the final component, like a typical `splitext`.
///
/// A leading dot (hidden file) does not start an extension.
fn split_extension(file_name: &str) -> (&str, &str) {
    let last_sep = file_name.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let base = &file_name[last_sep..];
    let leading_dots = base.len() - base.trim_start_matches('.').len();
    match base[leading_dots..].rfind('.') {
        Some(i) => file_name.split_at(last_sep + leading_dots + i),
        None => (file_name, ""),
    }
}

/// `"<name> (<id>)"`.
pub fn format_selector(name: &str, id: u64) -> String {
    format!("{} ({})", name, id)
}

/// Parse `"<name> (<id>)"` using the last parenthesized group, so names that
/// contain parentheses survive.
pub fn parse_selector(selector: &str) -> Option<(String, u64)> {
    let open = selector.rfind('(')?;
    let close = selector.rfind(')')?;
    if close <= open {
        return None;
    }
    let id = selector[open + 1..close].trim().parse().ok()?;
    Some((selector[..open].trim().to_string(), id))
}
