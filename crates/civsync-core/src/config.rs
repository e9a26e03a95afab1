//! Centralized configuration for civsync.
//!
//! Constants live in associated-const structs; user-tunable settings live in
//! [`BrowserConfig`], which is read from a JSON file with every field
//! defaulted.

use crate::error::{CivsyncError, Result};
use crate::metadata::read_optional;
use crate::models::ContentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const API_BASE: &'static str = "https://civitai.com/api/v1";
    pub const SITE_BASE: &'static str = "https://civitai.com";
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
    pub const PLATFORM_HINT: &'static str = "Windows";
}

/// Catalog browsing limits and defaults.
pub struct CatalogConfig;

impl CatalogConfig {
    pub const DEFAULT_PAGE_SIZE: u32 = 27;
    pub const MAX_PAGE_SIZE: u32 = 100;
    /// PickleTensor files at or below this size on a LORA version are embeddings.
    pub const EMBEDDING_MAX_SIZE_KB: f64 = 100.0;
    pub const CARD_NAME_MAX_CHARS: usize = 35;
    pub const SIDECAR_EXTENSION: &'static str = "json";
    pub const BASE_MODEL_OPTIONS: &'static [&'static str] = &[
        "SD 1.4",
        "SD 1.5",
        "SD 1.5 LCM",
        "SD 1.5 Hyper",
        "SD 2.0",
        "SD 2.0 768",
        "SD 2.1",
        "SD 2.1 768",
        "SD 2.1 Unclip",
        "SDXL 0.9",
        "SDXL 1.0",
        "SD 3",
        "SD 3.5",
        "SD 3.5 Medium",
        "SD 3.5 Large",
        "SD 3.5 Large Turbo",
        "Pony",
        "Flux.1 S",
        "Flux.1 D",
        "Flux.1 Kontext",
        "AuraFlow",
        "SDXL 1.0 LCM",
        "SDXL Distilled",
        "SDXL Turbo",
        "SDXL Lightning",
        "SDXL Hyper",
        "SVD",
        "SVD XT",
        "Playground v2",
        "PixArt a",
        "PixArt E",
        "Hunyuan 1",
        "Hunyuan Video",
        "Illustrious",
        "LTXV",
        "NoobAI",
        "Wan Video",
        "Other",
    ];
}

/// The three roots every built-in folder default hangs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootDirs {
    pub models_root: PathBuf,
    pub data_root: PathBuf,
    pub extensions_root: PathBuf,
}

impl Default for RootDirs {
    fn default() -> Self {
        Self {
            models_root: PathBuf::from("models"),
            data_root: PathBuf::from("."),
            extensions_root: PathBuf::from("extensions"),
        }
    }
}

/// Per-category folder overrides. Unset means "use the built-in default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderOverrides {
    pub ckpt_dir: Option<PathBuf>,
    pub hypernetwork_dir: Option<PathBuf>,
    pub embeddings_dir: Option<PathBuf>,
    pub lora_dir: Option<PathBuf>,
    pub vae_dir: Option<PathBuf>,
    pub controlnet_dir: Option<PathBuf>,
    pub swinir_dir: Option<PathBuf>,
    pub realesrgan_dir: Option<PathBuf>,
    pub gfpgan_dir: Option<PathBuf>,
    pub bsrgan_dir: Option<PathBuf>,
    pub esrgan_dir: Option<PathBuf>,
}

/// Proxy settings for the catalog client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Proxy URL (`host:port` or full URL). Empty or unset disables the proxy.
    pub url: Option<String>,
    /// Accept any certificate when going through the proxy.
    pub disable_ssl: bool,
    /// PEM bundle to trust when going through the proxy.
    pub ca_bundle: Option<PathBuf>,
}

/// Network settings for the catalog client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub proxy: ProxySettings,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: NetworkConfig::API_BASE.to_string(),
            proxy: ProxySettings::default(),
            connect_timeout_secs: NetworkConfig::CONNECT_TIMEOUT.as_secs(),
            read_timeout_secs: NetworkConfig::READ_TIMEOUT.as_secs(),
        }
    }
}

impl NetworkSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// The API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// User-tunable settings for a browsing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub roots: RootDirs,
    pub folder_overrides: FolderOverrides,
    /// Treat LORA, LoCon and DoRA as one family sharing the LoRA folder.
    pub combine_lora_family: bool,
    /// Drop versions whose early-access window is still open.
    pub hide_early_access: bool,
    /// Hide sub-folders whose name starts with a dot.
    pub hide_dot_subfolders: bool,
    /// Category key to default sub-folder, e.g. `"Checkpoint": "/SDXL"`.
    ///
    /// Keys are wire names, the upscaler family names (`ESRGAN`, ...) or
    /// `LORA_LoCon` for the combined LoRA family.
    pub default_subfolders: BTreeMap<String, String>,
    pub network: NetworkSettings,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            roots: RootDirs::default(),
            folder_overrides: FolderOverrides::default(),
            combine_lora_family: true,
            hide_early_access: false,
            hide_dot_subfolders: true,
            default_subfolders: BTreeMap::new(),
            network: NetworkSettings::default(),
        }
    }
}

impl BrowserConfig {
    /// Load settings from a JSON file.
    ///
    /// Returns `None` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let Some(contents) = read_optional(path)? else {
            return Ok(None);
        };
        let config: Self = serde_json::from_str(&contents).map_err(|e| CivsyncError::Config {
            message: format!("Invalid settings file {}: {}", path.display(), e),
        })?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(Some(config))
    }

    /// Load settings from a JSON file, falling back to defaults when it is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path)? {
            Some(config) => Ok(config),
            None => {
                debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.connect_timeout_secs == 0 || self.network.read_timeout_secs == 0 {
            return Err(CivsyncError::Validation {
                field: "network".into(),
                message: "timeouts must be greater than zero".into(),
            });
        }
        if self.network.api_base.trim().is_empty() {
            return Err(CivsyncError::Config {
                message: "network.api_base must not be empty".into(),
            });
        }
        url::Url::parse(self.network.api_base.trim()).map_err(|e| CivsyncError::Config {
            message: format!("network.api_base is not a valid URL: {}", e),
        })?;
        Ok(())
    }

    /// Configured default sub-folder for a category key.
    ///
    /// `"None"` and blank values count as unset.
    pub fn default_subfolder(&self, key: &str) -> Option<&str> {
        self.default_subfolders
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty() && *value != "None")
    }

    /// Whether LoCon files go to the LoRA folder for this lookup.
    pub fn lora_unified(&self, content_type: ContentType, from_check: bool) -> bool {
        content_type.is_lora_family() && self.combine_lora_family && !from_check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = BrowserConfig::default();
        assert!(config.combine_lora_family);
        assert!(!config.hide_early_access);
        assert!(config.hide_dot_subfolders);
        assert_eq!(config.network.connect_timeout(), Duration::from_secs(60));
        assert_eq!(config.network.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.roots.models_root, PathBuf::from("models"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("civsync.json");
        assert!(BrowserConfig::load(&path).unwrap().is_none());
        assert_eq!(
            BrowserConfig::load_or_default(&path).unwrap(),
            BrowserConfig::default()
        );
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("civsync.json");
        std::fs::write(
            &path,
            r#"{
                "hide_early_access": true,
                "folder_overrides": {"lora_dir": "/data/lora"},
                "default_subfolders": {"Checkpoint": "/SDXL", "VAE": "None"},
                "network": {"api_key": "  "}
            }"#,
        )
        .unwrap();

        let config = BrowserConfig::load(&path).unwrap().unwrap();
        assert!(config.hide_early_access);
        assert!(config.combine_lora_family);
        assert_eq!(
            config.folder_overrides.lora_dir,
            Some(PathBuf::from("/data/lora"))
        );
        assert_eq!(config.default_subfolder("Checkpoint"), Some("/SDXL"));
        assert_eq!(config.default_subfolder("VAE"), None);
        assert_eq!(config.network.api_key(), None);
        assert_eq!(config.network.read_timeout_secs, 30);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("civsync.json");
        std::fs::write(&path, r#"{"roots": "#).unwrap();
        let err = BrowserConfig::load(&path).unwrap_err();
        assert_eq!(err.error_kind(), "config");
        assert!(err.to_string().contains("civsync.json"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("civsync.json");
        std::fs::write(&path, r#"{"network": {"read_timeout_secs": 0}}"#).unwrap();
        let err = BrowserConfig::load(&path).unwrap_err();
        assert_eq!(err.error_kind(), "validation");
    }

    #[test]
    fn test_lora_unified() {
        let config = BrowserConfig::default();
        assert!(config.lora_unified(ContentType::LoCon, false));
        assert!(!config.lora_unified(ContentType::LoCon, true));
        assert!(!config.lora_unified(ContentType::Checkpoint, false));
    }
}
