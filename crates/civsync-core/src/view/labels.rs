//! Display strings for versions, files and trained words.

use crate::config::CatalogConfig;
use crate::models::ModelFile;
use regex::Regex;
use std::sync::LazyLock;

/// Suffix marking an installed version in selector labels.
pub const INSTALLED_SUFFIX: &str = " [Installed]";

const UNKNOWN: &str = "Unknown";

static PROMPT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*:[^>]*>").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\s*,\s*)+").unwrap());

/// Human-readable size with 1024-based units and two decimals.
///
/// # Examples
///
/// ```
/// use civsync_core::view::human_size;
///
/// assert_eq!(human_size(1536.0), "1.50 KB");
/// assert_eq!(human_size(0.0), "0 B");
/// ```
pub fn human_size(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes <= 0.0 {
        return "0 B".to_string();
    }
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// `"<size> <format> <fp> (<human size>)"`; absent parts read `Unknown`.
pub fn file_label(file: &ModelFile) -> String {
    let part = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());
    let size = file
        .size_kb
        .map(|kb| human_size(kb * 1024.0))
        .unwrap_or_else(|| UNKNOWN.to_string());
    format!(
        "{} {} {} ({})",
        part(&file.metadata.size),
        part(&file.metadata.format),
        part(&file.metadata.fp),
        size
    )
}

/// Join trained words into one prompt string.
///
/// Inline `<name:weight>` tags are removed; separators, including the empty
/// ones a removed tag leaves behind, collapse to `", "`.
pub fn clean_trained_words(words: &[String]) -> String {
    let joined = words.join(",");
    let stripped = PROMPT_TAG_RE.replace_all(&joined, "");
    let normalized = SEPARATOR_RE.replace_all(&stripped, ", ");
    normalized
        .trim_matches(|c| c == ',' || c == ' ')
        .to_string()
}

pub fn version_label(name: &str, installed: bool) -> String {
    if installed {
        format!("{}{}", name, INSTALLED_SUFFIX)
    } else {
        name.to_string()
    }
}

/// Version name from a selector label.
pub fn strip_installed_suffix(label: &str) -> &str {
    label.strip_suffix(INSTALLED_SUFFIX).unwrap_or(label)
}

/// Card title, cut to the card width with a trailing ellipsis.
pub fn card_title(name: &str) -> String {
    let max = CatalogConfig::CARD_NAME_MAX_CHARS;
    if name.chars().count() > max {
        let cut: String = name.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(json: serde_json::Value) -> ModelFile {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512.0), "512.00 B");
        assert_eq!(human_size(1024.0 * 1024.0 * 2.0), "2.00 MB");
        assert_eq!(human_size(1024f64.powi(5) * 3.0), "3072.00 TB");
    }

    #[test]
    fn test_file_label() {
        let full = file(serde_json::json!({
            "id": 1, "name": "a.safetensors", "sizeKB": 2048.0,
            "metadata": {"size": "pruned", "format": "SafeTensor", "fp": "fp16"}
        }));
        assert_eq!(file_label(&full), "pruned SafeTensor fp16 (2.00 MB)");

        let bare = file(serde_json::json!({"id": 2, "name": "b.pt"}));
        assert_eq!(file_label(&bare), "Unknown Unknown Unknown (Unknown)");
    }

    #[test]
    fn test_clean_trained_words() {
        let words = vec![
            "masterpiece".to_string(),
            "<lora:style:0.8>".to_string(),
            "best quality,detailed".to_string(),
        ];
        assert_eq!(
            clean_trained_words(&words),
            "masterpiece, best quality, detailed"
        );
        assert_eq!(clean_trained_words(&[]), "");
    }

    #[test]
    fn test_version_labels() {
        let label = version_label("v1.0", true);
        assert_eq!(label, "v1.0 [Installed]");
        assert_eq!(strip_installed_suffix(&label), "v1.0");
        assert_eq!(strip_installed_suffix("v2"), "v2");
    }

    #[test]
    fn test_card_title() {
        assert_eq!(card_title("short"), "short");
        let long = "x".repeat(40);
        assert_eq!(card_title(&long), format!("{}...", "x".repeat(35)));
    }
}
