//! Image generation handler for the OpenAI image MCP server.
//!
//! This module provides the `ImageHandler` struct, which turns one validated
//! generation request into an upstream call to `POST /images/generations` and
//! writes every returned image to disk.

use crate::options::{GenerationOptions, GenerationRequest};
use crate::source::{BatchSource, ImageKind, ImageSource, ImagesResponse, StreamSource};
use openai_image_mcp_common::config::Config;
use openai_image_mcp_common::error::Error;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Header carrying the optional organization id.
pub const ORGANIZATION_HEADER: &str = "OpenAI-Organization";

/// One image generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGenerateParams {
    /// Text prompt describing the image to generate.
    pub prompt: String,
    /// Local file path the image is written to.
    pub output: String,
    /// Model-specific options.
    pub options: GenerationOptions,
}

impl ImageGenerateParams {
    /// Validate the parameters.
    ///
    /// Only presence is checked; sizes, qualities and ranges are left to the API.
    pub fn validate(&self) -> Result<(), Error> {
        if self.prompt.trim().is_empty() {
            return Err(Error::validation("prompt is required"));
        }
        if self.output.trim().is_empty() {
            return Err(Error::validation("output is required"));
        }
        Ok(())
    }
}

/// A file written during generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    /// Path the image was written to.
    pub path: String,
    /// 1-based position, matching the last numeric suffix in the file name.
    /// For partial images this is the partial number.
    pub index: usize,
    /// True for streamed preview images.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

/// Outcome of one generation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerateResult {
    /// Files written, in the order they were produced.
    pub saved_files: Vec<SavedFile>,
    /// Upstream response metadata with image payloads removed.
    pub response: Value,
    /// Set when generation failed after some files were already written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete: Option<String>,
}

impl ImageGenerateResult {
    /// Paths of all written files.
    pub fn paths(&self) -> Vec<&str> {
        self.saved_files.iter().map(|f| f.path.as_str()).collect()
    }
}

/// Path for final image `index` (0-based) out of `total`.
///
/// A single image goes to `output` unchanged; several images get a 1-based
/// `-<n>` suffix before the extension (`out.png` -> `out-1.png`, `out-2.png`).
pub fn output_path(output: &str, index: usize, total: usize) -> String {
    if total <= 1 {
        output.to_string()
    } else {
        suffixed_path(output, &(index + 1).to_string())
    }
}

/// Path for partial `index` of final image `image` (both 0-based) out of `total`.
///
/// With one final image this is `out-partial-1.png`; with several the image
/// number comes first (`out-2-partial-1.png`) so previews of different images
/// never share a name.
pub fn partial_output_path(output: &str, image: usize, index: usize, total: usize) -> String {
    if total <= 1 {
        suffixed_path(output, &format!("partial-{}", index + 1))
    } else {
        suffixed_path(output, &format!("{}-partial-{}", image + 1, index + 1))
    }
}

fn suffixed_path(output: &str, suffix: &str) -> String {
    let path = Path::new(output);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    let file_name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{}-{}.{}", stem, suffix, ext),
        None => format!("{}-{}", stem, suffix),
    };
    path.with_file_name(file_name).to_string_lossy().into_owned()
}

/// Write every image `source` yields under names derived from `output`.
///
/// Parent directories are not created. Failures are collected rather than
/// aborting: a failed write is skipped, and a failed fetch is skipped when the
/// source is resumable. If at least one file was written the result lists it
/// and the failures are joined into `incomplete`; otherwise the first failure
/// is returned.
pub async fn persist_images(
    source: &mut dyn ImageSource,
    output: &str,
    endpoint: &str,
) -> Result<ImageGenerateResult, Error> {
    let total = source.expected_images();
    let mut saved_files = Vec::new();
    let mut failures = Vec::new();

    loop {
        let next = match source.next_image().await {
            Ok(Some(image)) => image,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to fetch image");
                failures.push(e);
                if source.resumable() {
                    continue;
                }
                break;
            }
        };

        let (path, index, partial) = match next.kind {
            ImageKind::Final(i) => (output_path(output, i, total), i + 1, false),
            ImageKind::Partial { image, index } => {
                (partial_output_path(output, image, index, total), index + 1, true)
            }
        };

        match tokio::fs::write(&path, &next.bytes).await {
            Ok(()) => {
                debug!(path = %path, bytes = next.bytes.len(), partial, "Wrote image");
                saved_files.push(SavedFile { path, index, partial });
            }
            Err(e) => {
                let e = Error::filesystem(&path, e);
                warn!(error = %e, "Failed to write image");
                failures.push(e);
            }
        }
    }

    if saved_files.is_empty() {
        return Err(failures
            .into_iter()
            .next()
            .unwrap_or_else(|| Error::invalid_response(endpoint, 200, "No images returned from API")));
    }

    let incomplete = if failures.is_empty() {
        None
    } else {
        warn!(failed = failures.len(), saved = saved_files.len(), "Generation only partly succeeded");
        Some(failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))
    };

    info!(count = saved_files.len(), "Saved images to local files");
    Ok(ImageGenerateResult {
        saved_files,
        response: source.metadata(),
        incomplete,
    })
}

/// Image generation handler.
///
/// Handles image generation requests using the OpenAI Images API.
pub struct ImageHandler {
    /// Application configuration.
    pub config: Config,
    /// HTTP client for API requests and image downloads.
    pub http: reqwest::Client,
}

impl ImageHandler {
    /// Create a new ImageHandler with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    #[instrument(level = "debug", name = "image_handler_new", skip_all)]
    pub fn new(config: Config) -> Result<Self, Error> {
        debug!(config = ?config, "Initializing ImageHandler");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::network(config.images_endpoint(), format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Generate images from a text prompt and write them to disk.
    ///
    /// # Returns
    /// * `Ok(ImageGenerateResult)` - Written files and response metadata
    /// * `Err(Error)` - If validation fails, the API call fails, or nothing could be written
    #[instrument(
        level = "info",
        name = "generate_image",
        skip(self, params),
        fields(model = %params.options.model(), streaming = params.options.is_streaming())
    )]
    pub async fn generate_image(&self, params: ImageGenerateParams) -> Result<ImageGenerateResult, Error> {
        params.validate()?;

        let endpoint = self.config.images_endpoint();
        let request = GenerationRequest::new(&params.prompt, &params.options);
        let response = self.send(&endpoint, &request).await?;

        let mut source: Box<dyn ImageSource> = if params.options.is_streaming() {
            Box::new(
                StreamSource::new(response, endpoint.clone(), params.options.requested_images())
                    .with_timeout(self.config.request_timeout_secs),
            )
        } else {
            let status = response.status().as_u16();
            let body: ImagesResponse = response.json().await.map_err(|e| {
                Error::invalid_response(&endpoint, status, format!("Failed to parse response: {}", e))
            })?;
            info!(count = body.data.len(), "Received images from API");
            Box::new(BatchSource::new(self.http.clone(), &endpoint, body)?)
        };

        persist_images(source.as_mut(), &params.output, &endpoint).await
    }

    /// Send the generation request, returning the response if it succeeded.
    async fn send(&self, endpoint: &str, request: &GenerationRequest<'_>) -> Result<reqwest::Response, Error> {
        debug!(endpoint = %endpoint, model = request.model, "Calling OpenAI Images API");

        let mut builder = self.http.post(endpoint).bearer_auth(&self.config.api_key).json(request);
        if let Some(organization) = &self.config.organization {
            builder = builder.header(ORGANIZATION_HEADER, organization);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(self.config.request_timeout_secs)
            } else {
                Error::network(endpoint, format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(endpoint, status.as_u16(), body));
        }

        Ok(response)
    }
}
