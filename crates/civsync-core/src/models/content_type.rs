//! Catalog content categories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Option label that stands for the whole LoRA family when they are combined.
pub const COMBINED_LORA_OPTION: &str = "LORA, LoCon, DoRA";

/// Content category of a catalog entry.
///
/// Wire names follow the catalog's `type` field exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentType {
    Checkpoint,
    TextualInversion,
    Hypernetwork,
    AestheticGradient,
    #[serde(rename = "LORA")]
    Lora,
    LoCon,
    DoRA,
    Controlnet,
    Upscaler,
    MotionModule,
    #[serde(rename = "VAE")]
    Vae,
    Poses,
    Wildcards,
    Workflows,
    Other,
    /// The models root itself; never returned by the catalog.
    #[serde(rename = "modelFolder")]
    ModelFolder,
    /// Anything the catalog adds that this build does not know about.
    #[serde(other)]
    Unknown,
}

impl ContentType {
    /// Every category the catalog can be filtered by.
    pub const FILTERABLE: [ContentType; 15] = [
        ContentType::Checkpoint,
        ContentType::TextualInversion,
        ContentType::Hypernetwork,
        ContentType::AestheticGradient,
        ContentType::Lora,
        ContentType::LoCon,
        ContentType::DoRA,
        ContentType::Controlnet,
        ContentType::Upscaler,
        ContentType::MotionModule,
        ContentType::Vae,
        ContentType::Poses,
        ContentType::Wildcards,
        ContentType::Workflows,
        ContentType::Other,
    ];

    /// The catalog's wire name for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Checkpoint => "Checkpoint",
            ContentType::TextualInversion => "TextualInversion",
            ContentType::Hypernetwork => "Hypernetwork",
            ContentType::AestheticGradient => "AestheticGradient",
            ContentType::Lora => "LORA",
            ContentType::LoCon => "LoCon",
            ContentType::DoRA => "DoRA",
            ContentType::Controlnet => "Controlnet",
            ContentType::Upscaler => "Upscaler",
            ContentType::MotionModule => "MotionModule",
            ContentType::Vae => "VAE",
            ContentType::Poses => "Poses",
            ContentType::Wildcards => "Wildcards",
            ContentType::Workflows => "Workflows",
            ContentType::Other => "Other",
            ContentType::ModelFolder => "modelFolder",
            ContentType::Unknown => "Unknown",
        }
    }

    /// Short label used on cards and badges.
    pub fn display_name(&self) -> &'static str {
        match self {
            ContentType::TextualInversion => "Embedding",
            ContentType::Hypernetwork => "Hypernet",
            ContentType::AestheticGradient => "Aesthetic",
            ContentType::MotionModule => "Motion",
            ContentType::Workflows => "Workflow",
            ContentType::Wildcards => "Wildcard",
            ContentType::ModelFolder => "Model",
            other => other.as_str(),
        }
    }

    /// LORA, LoCon and DoRA share one loading mechanism.
    pub fn is_lora_family(&self) -> bool {
        matches!(
            self,
            ContentType::Lora | ContentType::LoCon | ContentType::DoRA
        )
    }

    /// Parse a wire name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::FILTERABLE
            .iter()
            .chain(std::iter::once(&ContentType::ModelFolder))
            .find(|ct| ct.as_str().eq_ignore_ascii_case(s))
            .copied()
    }

    /// Expand UI option labels into a category set.
    ///
    /// The combined LoRA option only exists when `combine_lora_family` is set;
    /// it expands to all three family members.
    pub fn from_options<S: AsRef<str>>(options: &[S], combine_lora_family: bool) -> BTreeSet<Self> {
        let mut types = BTreeSet::new();
        for option in options {
            let option = option.as_ref();
            if option == COMBINED_LORA_OPTION {
                if combine_lora_family {
                    types.extend([ContentType::Lora, ContentType::LoCon, ContentType::DoRA]);
                } else {
                    warn!("Ignoring combined LoRA option while LoRA types are kept separate");
                }
                continue;
            }
            match Self::parse(option) {
                Some(ct) => {
                    types.insert(ct);
                }
                None => warn!("Unknown content type option: {}", option),
            }
        }
        types
    }

    /// Option labels a filter UI should offer.
    pub fn option_labels(combine_lora_family: bool) -> Vec<&'static str> {
        let mut labels = Vec::new();
        for ct in Self::FILTERABLE {
            if combine_lora_family && ct.is_lora_family() {
                if ct == ContentType::Lora {
                    labels.push(COMBINED_LORA_OPTION);
                }
                continue;
            }
            labels.push(ct.as_str());
        }
        labels
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_roundtrip() {
        for ct in ContentType::FILTERABLE {
            let json = serde_json::to_string(&ct).unwrap();
            assert_eq!(json, format!("\"{}\"", ct.as_str()));
            let parsed: ContentType = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, ct);
        }
    }

    #[test]
    fn test_unknown_wire_name() {
        let parsed: ContentType = serde_json::from_str("\"Detection\"").unwrap();
        assert_eq!(parsed, ContentType::Unknown);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ContentType::TextualInversion.display_name(), "Embedding");
        assert_eq!(ContentType::Wildcards.display_name(), "Wildcard");
        assert_eq!(ContentType::Checkpoint.display_name(), "Checkpoint");
    }

    #[test]
    fn test_combined_option_expands() {
        let types = ContentType::from_options(&[COMBINED_LORA_OPTION, "Checkpoint"], true);
        assert_eq!(types.len(), 4);
        assert!(types.contains(&ContentType::LoCon));
        assert!(types.contains(&ContentType::DoRA));

        let types = ContentType::from_options(&[COMBINED_LORA_OPTION], false);
        assert!(types.is_empty());
    }

    #[test]
    fn test_option_labels() {
        let combined = ContentType::option_labels(true);
        assert!(combined.contains(&COMBINED_LORA_OPTION));
        assert!(!combined.contains(&"LoCon"));

        let separate = ContentType::option_labels(false);
        assert!(separate.contains(&"LoCon"));
        assert!(!separate.contains(&COMBINED_LORA_OPTION));
    }
}
