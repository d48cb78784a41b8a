//! Per-model generation options.
//!
//! The tool accepts one flat argument object, but each upstream model takes a
//! different parameter set. [`GenerationOptions`] has one variant per model and
//! each variant only carries the fields that model accepts, so a request body
//! built from it can never contain a field meant for another model.
//!
//! Values are not checked against the model's allowed sizes, qualities or
//! ranges here; the API is the authority and its rejections surface as
//! upstream errors.

use openai_image_mcp_common::models::ImageModel;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Options for `gpt-image-1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GptImageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_compression: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_images: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Options for `dall-e-3`.
///
/// The model generates exactly one image per request; `n` is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DallE3Options {
    #[serde(skip_deserializing)]
    pub n: SingleImage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Options for `dall-e-2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DallE2Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Image count that always serializes as `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleImage;

impl Serialize for SingleImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(1)
    }
}

/// Generation options for exactly one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GenerationOptions {
    GptImage(GptImageOptions),
    DallE3(DallE3Options),
    DallE2(DallE2Options),
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions::for_model(ImageModel::default())
    }
}

impl GenerationOptions {
    /// Options with every field left to the model's defaults.
    pub fn for_model(model: ImageModel) -> Self {
        match model {
            ImageModel::GptImage1 => GenerationOptions::GptImage(GptImageOptions::default()),
            ImageModel::DallE3 => GenerationOptions::DallE3(DallE3Options::default()),
            ImageModel::DallE2 => GenerationOptions::DallE2(DallE2Options::default()),
        }
    }

    /// Options for `model` read from a flat tool-argument object.
    ///
    /// Only the fields `model` accepts are looked at. Any other key, whatever
    /// its value, is ignored.
    pub fn from_arguments(model: ImageModel, args: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let args = Value::Object(args.clone());
        Ok(match model {
            ImageModel::GptImage1 => GenerationOptions::GptImage(GptImageOptions::deserialize(&args)?),
            ImageModel::DallE3 => GenerationOptions::DallE3(DallE3Options::deserialize(&args)?),
            ImageModel::DallE2 => GenerationOptions::DallE2(DallE2Options::deserialize(&args)?),
        })
    }

    /// The model these options target.
    pub fn model(&self) -> ImageModel {
        match self {
            GenerationOptions::GptImage(_) => ImageModel::GptImage1,
            GenerationOptions::DallE3(_) => ImageModel::DallE3,
            GenerationOptions::DallE2(_) => ImageModel::DallE2,
        }
    }

    /// Whether the response should be consumed as a server-sent event stream.
    pub fn is_streaming(&self) -> bool {
        matches!(self, GenerationOptions::GptImage(opts) if opts.stream == Some(true))
    }

    /// Number of final images the request asks for.
    pub fn requested_images(&self) -> usize {
        let n = match self {
            GenerationOptions::GptImage(opts) => opts.n,
            GenerationOptions::DallE3(_) => Some(1),
            GenerationOptions::DallE2(opts) => opts.n,
        };
        n.map(|n| n.max(1) as usize).unwrap_or(1)
    }
}

/// Request body for `POST /images/generations`.
#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    pub model: &'static str,
    pub prompt: &'a str,
    #[serde(flatten)]
    pub options: &'a GenerationOptions,
}

impl<'a> GenerationRequest<'a> {
    /// Build the request body for `prompt` with `options`.
    pub fn new(prompt: &'a str, options: &'a GenerationOptions) -> Self {
        Self {
            model: options.model().as_str(),
            prompt,
            options,
        }
    }
}
