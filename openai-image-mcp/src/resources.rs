//! MCP Resources for the image server.
//!
//! This module provides resource implementations for:
//! - `image://models` - List available image generation models
//! - `image://providers` - List available image providers

use openai_image_mcp_common::models::{ImageModel, ModelRegistry};
use serde::Serialize;

/// URI of the models resource.
pub const MODELS_URI: &str = "image://models";

/// URI of the providers resource.
pub const PROVIDERS_URI: &str = "image://providers";

/// Information about an available image generation model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: &'static str,
    /// Supported size strings
    pub supported_sizes: Vec<&'static str>,
    /// Supported quality values
    pub supported_qualities: Vec<&'static str>,
    /// Maximum number of images per request
    pub max_images: u8,
    /// Whether partial images can be streamed
    pub supports_streaming: bool,
    /// Tool arguments this model accepts besides prompt and output
    pub options: Vec<&'static str>,
    /// Whether this model is used when none is given
    pub is_default: bool,
}

/// Information about an available image provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    /// Provider identifier
    pub id: String,
    /// Provider display name
    pub name: String,
    /// Provider description
    pub description: String,
    /// Whether this is the default provider
    pub is_default: bool,
}

/// List all available image generation models.
pub fn list_models() -> Vec<ModelInfo> {
    let default = ImageModel::default().as_str();
    ModelRegistry::list()
        .iter()
        .map(|m| ModelInfo {
            id: m.id,
            supported_sizes: m.supported_sizes.to_vec(),
            supported_qualities: m.supported_qualities.to_vec(),
            max_images: m.max_images,
            supports_streaming: m.supports_streaming,
            options: m.options.to_vec(),
            is_default: m.id == default,
        })
        .collect()
}

/// List all available image providers.
pub fn list_providers() -> Vec<ProviderInfo> {
    vec![ProviderInfo {
        id: "openai".to_string(),
        name: "OpenAI Images".to_string(),
        description: "OpenAI Images API (gpt-image-1, DALL-E 3, DALL-E 2)".to_string(),
        is_default: true,
    }]
}

/// Get models resource as JSON string.
pub fn models_resource_json() -> String {
    serde_json::to_string_pretty(&list_models()).unwrap_or_else(|_| "[]".to_string())
}

/// Get providers resource as JSON string.
pub fn providers_resource_json() -> String {
    serde_json::to_string_pretty(&list_providers()).unwrap_or_else(|_| "[]".to_string())
}
