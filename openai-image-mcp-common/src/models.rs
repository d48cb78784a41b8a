//! Model definitions and registry for the OpenAI image models.
//!
//! The three models accept different parameter sets; the static definitions
//! here drive the tool description, the `image://models` resource and the
//! per-model option mapping.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported image generation models.
///
/// Defaults to `dall-e-2`, the least capable and cheapest model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum ImageModel {
    /// GPT image model: inline base64 output, transparency, streaming
    #[serde(rename = "gpt-image-1")]
    GptImage1,
    /// DALL-E 3: one image per request, style and HD quality
    #[serde(rename = "dall-e-3")]
    DallE3,
    /// DALL-E 2: up to 10 images per request
    #[default]
    #[serde(rename = "dall-e-2")]
    DallE2,
}

impl ImageModel {
    /// All models, most capable first.
    pub const ALL: [ImageModel; 3] = [ImageModel::GptImage1, ImageModel::DallE3, ImageModel::DallE2];

    /// The upstream model identifier.
    pub fn as_str(&self) -> &'static str {
        self.info().id
    }

    /// Static definition for this model.
    pub fn info(&self) -> &'static ImageModelInfo {
        match self {
            ImageModel::GptImage1 => &GPT_IMAGE_1,
            ImageModel::DallE3 => &DALL_E_3,
            ImageModel::DallE2 => &DALL_E_2,
        }
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelRegistry::resolve(s).ok_or_else(|| {
            format!(
                "Unknown model '{}'. Valid models: {}",
                s,
                ImageModel::ALL.map(|m| m.as_str()).join(", ")
            )
        })
    }
}

/// Image model definition.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImageModelInfo {
    /// Upstream model identifier
    pub id: &'static str,
    /// Supported size strings
    pub supported_sizes: &'static [&'static str],
    /// Supported quality values
    pub supported_qualities: &'static [&'static str],
    /// Maximum number of images per request
    pub max_images: u8,
    /// Whether the model can stream partial images
    pub supports_streaming: bool,
    /// Whether the model can return hosted URLs instead of inline data
    pub supports_url_output: bool,
    /// Tool arguments forwarded upstream for this model (besides prompt)
    pub options: &'static [&'static str],
}

/// GPT image model
pub const GPT_IMAGE_1: ImageModelInfo = ImageModelInfo {
    id: "gpt-image-1",
    supported_sizes: &["auto", "1024x1024", "1536x1024", "1024x1536"],
    supported_qualities: &["auto", "high", "medium", "low"],
    max_images: 10,
    supports_streaming: true,
    supports_url_output: false,
    options: &[
        "n",
        "size",
        "quality",
        "background",
        "moderation",
        "output_compression",
        "output_format",
        "partial_images",
        "stream",
        "user",
    ],
};

/// DALL-E 3
pub const DALL_E_3: ImageModelInfo = ImageModelInfo {
    id: "dall-e-3",
    supported_sizes: &["1024x1024", "1792x1024", "1024x1792"],
    supported_qualities: &["standard", "hd"],
    max_images: 1,
    supports_streaming: false,
    supports_url_output: true,
    options: &["size", "quality", "style", "response_format", "user"],
};

/// DALL-E 2
pub const DALL_E_2: ImageModelInfo = ImageModelInfo {
    id: "dall-e-2",
    supported_sizes: &["256x256", "512x512", "1024x1024"],
    supported_qualities: &["standard"],
    max_images: 10,
    supports_streaming: false,
    supports_url_output: true,
    options: &["n", "size", "response_format", "user"],
};

/// All available image models
pub const IMAGE_MODELS: &[ImageModelInfo] = &[GPT_IMAGE_1, DALL_E_3, DALL_E_2];

/// Model registry for resolution and listing.
pub struct ModelRegistry;

impl ModelRegistry {
    /// Resolve a model identifier, ignoring case and surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use openai_image_mcp_common::models::{ImageModel, ModelRegistry};
    ///
    /// assert_eq!(ModelRegistry::resolve("dall-e-3"), Some(ImageModel::DallE3));
    /// assert_eq!(ModelRegistry::resolve("GPT-IMAGE-1"), Some(ImageModel::GptImage1));
    /// assert_eq!(ModelRegistry::resolve("dall-e-4"), None);
    /// ```
    pub fn resolve(name: &str) -> Option<ImageModel> {
        let name = name.trim();
        ImageModel::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(name))
    }

    /// List all model definitions.
    pub fn list() -> &'static [ImageModelInfo] {
        IMAGE_MODELS
    }
}
