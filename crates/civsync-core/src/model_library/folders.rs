//! Folder resolution: content category to local directory.
//!
//! Precedence for every category:
//! 1. a caller-supplied custom base directory
//! 2. the per-category override from [`FolderOverrides`]
//! 3. the built-in default under the models, data or extensions root
//!
//! [`FolderOverrides`]: crate::config::FolderOverrides

use crate::config::BrowserConfig;
use crate::models::ContentType;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem existence checks, injectable for tests.
pub trait PathProbe: Send + Sync {
    fn is_dir(&self, path: &Path) -> bool;
}

/// [`PathProbe`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Upscaler families, detected from the model description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpscalerFamily {
    SwinIr,
    RealEsrgan,
    Gfpgan,
    Bsrgan,
    Esrgan,
}

impl UpscalerFamily {
    /// Families checked in order; `REALESRGAN` must be tested before the `ESRGAN` fallback.
    const DETECTION_ORDER: [UpscalerFamily; 4] = [
        UpscalerFamily::SwinIr,
        UpscalerFamily::RealEsrgan,
        UpscalerFamily::Gfpgan,
        UpscalerFamily::Bsrgan,
    ];

    /// Scan a description (case-insensitive); ESRGAN when nothing else matches.
    pub fn detect(description: Option<&str>) -> Self {
        let upper = description.unwrap_or_default().to_uppercase();
        Self::DETECTION_ORDER
            .into_iter()
            .find(|family| upper.contains(family.key()))
            .unwrap_or(UpscalerFamily::Esrgan)
    }

    /// Uppercase key used in descriptions and sub-folder settings.
    pub fn key(&self) -> &'static str {
        match self {
            UpscalerFamily::SwinIr => "SWINIR",
            UpscalerFamily::RealEsrgan => "REALESRGAN",
            UpscalerFamily::Gfpgan => "GFPGAN",
            UpscalerFamily::Bsrgan => "BSRGAN",
            UpscalerFamily::Esrgan => "ESRGAN",
        }
    }

    fn dir_name(&self) -> &'static str {
        match self {
            UpscalerFamily::SwinIr => "SwinIR",
            UpscalerFamily::RealEsrgan => "RealESRGAN",
            UpscalerFamily::Gfpgan => "GFPGAN",
            UpscalerFamily::Bsrgan => "BSRGAN",
            UpscalerFamily::Esrgan => "ESRGAN",
        }
    }
}

/// Inputs for one folder lookup.
#[derive(Debug, Clone, Copy)]
pub struct FolderQuery<'a> {
    pub content_type: ContentType,
    pub description: Option<&'a str>,
    /// Force LoCon to its own folder even when the LoRA family is combined.
    pub from_check: bool,
    /// Replaces the models and data roots and disables overrides.
    pub custom_base: Option<&'a Path>,
}

impl<'a> FolderQuery<'a> {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            description: None,
            from_check: false,
            custom_base: None,
        }
    }

    pub fn with_description(mut self, description: Option<&'a str>) -> Self {
        self.description = description;
        self
    }

    pub fn from_check(mut self, from_check: bool) -> Self {
        self.from_check = from_check;
        self
    }

    pub fn with_custom_base(mut self, base: Option<&'a Path>) -> Self {
        self.custom_base = base;
        self
    }
}

/// Resolves content categories to directories for one configuration.
pub struct FolderResolver<'a> {
    config: &'a BrowserConfig,
    probe: &'a dyn PathProbe,
}

impl<'a> FolderResolver<'a> {
    pub fn new(config: &'a BrowserConfig, probe: &'a dyn PathProbe) -> Self {
        Self { config, probe }
    }

    /// Directory for a category, or `None` when the category cannot be resolved.
    pub fn resolve(&self, query: FolderQuery<'_>) -> Option<PathBuf> {
        let roots = &self.config.roots;
        let overrides = &self.config.folder_overrides;
        let custom = query.custom_base;

        let models = custom.unwrap_or(roots.models_root.as_path());
        let data = custom.unwrap_or(roots.data_root.as_path());
        let extensions = roots.extensions_root.as_path();

        // Overrides only apply without a custom base.
        let pick = |over: &Option<PathBuf>, fallback: PathBuf| -> PathBuf {
            match (over, custom) {
                (Some(path), None) => path.clone(),
                _ => fallback,
            }
        };

        let path = match query.content_type {
            ContentType::ModelFolder => models.to_path_buf(),
            ContentType::Checkpoint => pick(&overrides.ckpt_dir, models.join("Stable-diffusion")),
            ContentType::Hypernetwork => {
                pick(&overrides.hypernetwork_dir, models.join("hypernetworks"))
            }
            ContentType::TextualInversion => {
                pick(&overrides.embeddings_dir, data.join("embeddings"))
            }
            ContentType::AestheticGradient => custom
                .map(Path::to_path_buf)
                .unwrap_or_else(|| extensions.join("stable-diffusion-webui-aesthetic-gradients"))
                .join("aesthetic_embeddings"),
            ContentType::Lora | ContentType::DoRA => {
                pick(&overrides.lora_dir, models.join("Lora"))
            }
            ContentType::LoCon => {
                if self.config.lora_unified(query.content_type, query.from_check) {
                    pick(&overrides.lora_dir, models.join("Lora"))
                } else {
                    models.join("LyCORIS")
                }
            }
            ContentType::Vae => pick(&overrides.vae_dir, models.join("VAE")),
            ContentType::Controlnet => {
                pick(&overrides.controlnet_dir, models.join("ControlNet"))
            }
            ContentType::Poses => models.join("Poses"),
            ContentType::MotionModule => extensions.join("sd-webui-animatediff").join("model"),
            ContentType::Workflows => models.join("Workflows"),
            ContentType::Other => {
                let is_adetailer = query
                    .description
                    .map(|d| d.to_uppercase().contains("ADETAILER"))
                    .unwrap_or(false);
                if is_adetailer {
                    models.join("adetailer")
                } else {
                    models.join("Other")
                }
            }
            ContentType::Wildcards => {
                let preferred = extensions.join("UnivAICharGen").join("wildcards");
                if self.probe.is_dir(&preferred) {
                    preferred
                } else {
                    extensions.join("sd-dynamic-prompts").join("wildcards")
                }
            }
            ContentType::Upscaler => {
                let family = UpscalerFamily::detect(query.description);
                let over = match family {
                    UpscalerFamily::SwinIr => &overrides.swinir_dir,
                    UpscalerFamily::RealEsrgan => &overrides.realesrgan_dir,
                    UpscalerFamily::Gfpgan => &overrides.gfpgan_dir,
                    UpscalerFamily::Bsrgan => &overrides.bsrgan_dir,
                    UpscalerFamily::Esrgan => &overrides.esrgan_dir,
                };
                pick(over, models.join(family.dir_name()))
            }
            ContentType::Unknown => {
                debug!("No folder for unknown content type");
                return None;
            }
        };

        Some(path)
    }

    /// Settings key for the category's default sub-folder.
    ///
    /// LORA and LoCon share `LORA_LoCon` when the family is combined; upscalers
    /// use their family key.
    pub fn subfolder_key(&self, content_type: ContentType, description: Option<&str>) -> String {
        match content_type {
            ContentType::Lora | ContentType::LoCon if self.config.combine_lora_family => {
                "LORA_LoCon".to_string()
            }
            ContentType::Upscaler => UpscalerFamily::detect(description).key().to_string(),
            other => other.as_str().to_string(),
        }
    }

    /// Configured default sub-folder for a category, if any.
    pub fn default_subfolder(
        &self,
        content_type: ContentType,
        description: Option<&str>,
    ) -> Option<String> {
        let key = self.subfolder_key(content_type, description);
        self.config.default_subfolder(&key).map(str::to_string)
    }
}
