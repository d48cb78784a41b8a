//! Image sources: where decoded images come from.
//!
//! An [`ImageSource`] yields a finite, non-restartable sequence of decoded
//! images and then `None` once the upstream signalled completion. The
//! non-streaming JSON response ([`BatchSource`]) and the server-sent event
//! stream ([`StreamSource`]) both implement it, so file naming and writing is
//! written once against the trait.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use openai_image_mcp_common::error::Error;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::{debug, warn};

/// Stream event carrying a partial image.
pub const PARTIAL_IMAGE_EVENT: &str = "image_generation.partial_image";

/// Stream event carrying a final image.
pub const COMPLETED_EVENT: &str = "image_generation.completed";

/// A generated image as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Hosted image that still has to be downloaded
    Url(String),
    /// Inline base64 payload
    Base64(String),
}

/// What a decoded image is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Final image at 0-based position `n`
    Final(usize),
    /// Preview of final image `image` (0-based) with the upstream's 0-based
    /// partial index
    Partial { image: usize, index: usize },
}

/// One decoded image ready to be written.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Final or partial, with its position
    pub kind: ImageKind,
    /// Raw image bytes as returned by the API
    pub bytes: Vec<u8>,
}

/// A finite sequence of decoded images.
#[async_trait]
pub trait ImageSource: Send {
    /// Number of final images this source will produce.
    fn expected_images(&self) -> usize;

    /// Next decoded image, or `None` once the sequence is complete.
    async fn next_image(&mut self) -> Result<Option<DecodedImage>, Error>;

    /// Whether `next_image` can be called again after it returned an error.
    ///
    /// True when every image is fetched independently, so one failure does
    /// not affect the rest.
    fn resumable(&self) -> bool {
        false
    }

    /// Upstream response metadata observed so far, without image payloads.
    fn metadata(&self) -> Value;
}

/// Decode an inline base64 payload.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, Error> {
    BASE64
        .decode(data.trim())
        .map_err(|e| Error::decode(format!("Invalid base64 data: {}", e)))
}

// =============================================================================
// Non-streaming responses
// =============================================================================

/// Images API response.
#[derive(Debug, Deserialize)]
pub struct ImagesResponse {
    /// Generated images
    #[serde(default)]
    pub data: Vec<ImageDatum>,
    /// Everything else (created, usage, output_format, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `ImagesResponse::data`.
#[derive(Debug, Deserialize)]
pub struct ImageDatum {
    /// Hosted image URL (dall-e models with `response_format=url`)
    pub url: Option<String>,
    /// Inline base64 image
    pub b64_json: Option<String>,
    /// Prompt as rewritten by the model (dall-e-3)
    pub revised_prompt: Option<String>,
}

impl ImageDatum {
    fn image(&self) -> Option<GeneratedImage> {
        match (&self.b64_json, &self.url) {
            (Some(data), _) => Some(GeneratedImage::Base64(data.clone())),
            (None, Some(url)) => Some(GeneratedImage::Url(url.clone())),
            (None, None) => None,
        }
    }
}

/// Images from a single JSON response, downloading URL results on demand.
pub struct BatchSource {
    http: reqwest::Client,
    pending: VecDeque<(usize, GeneratedImage)>,
    total: usize,
    metadata: Value,
}

impl BatchSource {
    /// Build a source from a parsed response.
    ///
    /// # Errors
    /// Returns an upstream error if the response holds no usable image.
    pub fn new(http: reqwest::Client, endpoint: &str, response: ImagesResponse) -> Result<Self, Error> {
        let images: Vec<GeneratedImage> = response
            .data
            .iter()
            .filter_map(|datum| {
                let image = datum.image();
                if image.is_none() {
                    warn!("Skipping response entry without url or b64_json");
                }
                image
            })
            .collect();

        if images.is_empty() {
            return Err(Error::invalid_response(endpoint, 200, "No images returned from API"));
        }

        let mut metadata = response.extra;
        let entries: Vec<Value> = response
            .data
            .iter()
            .map(|datum| {
                let mut entry = Map::new();
                if let Some(url) = &datum.url {
                    entry.insert("url".to_string(), Value::String(url.clone()));
                }
                if let Some(prompt) = &datum.revised_prompt {
                    entry.insert("revised_prompt".to_string(), Value::String(prompt.clone()));
                }
                Value::Object(entry)
            })
            .collect();
        metadata.insert("data".to_string(), Value::Array(entries));

        Ok(Self {
            http,
            total: images.len(),
            pending: images.into_iter().enumerate().collect(),
            metadata: Value::Object(metadata),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!(url = %url, "Downloading generated image");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(url, format!("Image download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(url, status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::network(url, format!("Image download interrupted: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSource for BatchSource {
    fn expected_images(&self) -> usize {
        self.total
    }

    async fn next_image(&mut self) -> Result<Option<DecodedImage>, Error> {
        let Some((index, image)) = self.pending.pop_front() else {
            return Ok(None);
        };

        let bytes = match image {
            GeneratedImage::Base64(data) => decode_base64(&data)?,
            GeneratedImage::Url(url) => self.download(&url).await?,
        };

        Ok(Some(DecodedImage {
            kind: ImageKind::Final(index),
            bytes,
        }))
    }

    fn resumable(&self) -> bool {
        true
    }

    fn metadata(&self) -> Value {
        self.metadata.clone()
    }
}

// =============================================================================
// Streaming responses
// =============================================================================

type EventResult = Result<Event, EventStreamError<reqwest::Error>>;

#[derive(Debug, Deserialize)]
struct PartialImageEvent {
    b64_json: String,
    #[serde(default)]
    partial_image_index: usize,
}

#[derive(Debug, Deserialize)]
struct CompletedEvent {
    b64_json: String,
}

/// Images from a server-sent event stream.
///
/// Partial images are yielded as they arrive; the source is complete after
/// `expected` completion events. Events are consumed strictly in order.
pub struct StreamSource {
    events: Pin<Box<dyn Stream<Item = EventResult> + Send>>,
    endpoint: String,
    expected: usize,
    completed: usize,
    timeout_secs: u64,
    metadata: Map<String, Value>,
}

impl StreamSource {
    /// Consume the body of a streaming response.
    pub fn new(response: reqwest::Response, endpoint: impl Into<String>, expected: usize) -> Self {
        Self::from_events(response.bytes_stream().eventsource(), endpoint, expected)
    }

    /// Build a source from an already parsed event stream.
    pub fn from_events<S>(events: S, endpoint: impl Into<String>, expected: usize) -> Self
    where
        S: Stream<Item = EventResult> + Send + 'static,
    {
        Self {
            events: Box::pin(events),
            endpoint: endpoint.into(),
            expected: expected.max(1),
            completed: 0,
            timeout_secs: 0,
            metadata: Map::new(),
        }
    }

    /// Timeout configured on the HTTP client, reported when the body stalls.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    fn interrupted(&self, e: EventStreamError<reqwest::Error>) -> Error {
        match e {
            EventStreamError::Transport(e) if e.is_timeout() => Error::timeout(self.timeout_secs),
            e => Error::network(&self.endpoint, format!("Image stream interrupted: {}", e)),
        }
    }

    fn parse_error(&self, what: &str, e: impl std::fmt::Display) -> Error {
        Error::invalid_response(&self.endpoint, 200, format!("Malformed {} event: {}", what, e))
    }

    fn record_metadata(&mut self, mut payload: Value) {
        if let Value::Object(fields) = &mut payload {
            fields.remove("b64_json");
            for (key, value) in std::mem::take(fields) {
                self.metadata.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl ImageSource for StreamSource {
    fn expected_images(&self) -> usize {
        self.expected
    }

    async fn next_image(&mut self) -> Result<Option<DecodedImage>, Error> {
        while self.completed < self.expected {
            let event = match self.events.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => return Err(self.interrupted(e)),
                None => {
                    return Err(Error::invalid_response(
                        &self.endpoint,
                        200,
                        format!(
                            "Image stream ended after {} of {} images",
                            self.completed, self.expected
                        ),
                    ));
                }
            };

            let data = event.data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }

            let payload: Value = serde_json::from_str(data).map_err(|e| self.parse_error("stream", e))?;
            let kind = payload
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(event.event.as_str())
                .to_string();

            match kind.as_str() {
                PARTIAL_IMAGE_EVENT => {
                    let partial: PartialImageEvent = serde_json::from_value(payload.clone())
                        .map_err(|e| self.parse_error("partial image", e))?;
                    debug!(image = self.completed, index = partial.partial_image_index, "Received partial image");
                    self.record_metadata(payload);
                    return Ok(Some(DecodedImage {
                        kind: ImageKind::Partial {
                            image: self.completed,
                            index: partial.partial_image_index,
                        },
                        bytes: decode_base64(&partial.b64_json)?,
                    }));
                }
                COMPLETED_EVENT => {
                    let completed: CompletedEvent = serde_json::from_value(payload.clone())
                        .map_err(|e| self.parse_error("completion", e))?;
                    let index = self.completed;
                    self.completed += 1;
                    debug!(index, "Received final image");
                    self.record_metadata(payload);
                    return Ok(Some(DecodedImage {
                        kind: ImageKind::Final(index),
                        bytes: decode_base64(&completed.b64_json)?,
                    }));
                }
                "error" => {
                    let body = payload.to_string();
                    let status = payload
                        .pointer("/error/code")
                        .and_then(Value::as_str)
                        .map(status_for_error_code)
                        .unwrap_or(400);
                    return Err(Error::api(&self.endpoint, status, body));
                }
                other => {
                    debug!(event = %other, "Ignoring stream event");
                }
            }
        }

        Ok(None)
    }

    fn metadata(&self) -> Value {
        Value::Object(self.metadata.clone())
    }
}

/// Map an error code carried inside a stream to the equivalent HTTP status.
fn status_for_error_code(code: &str) -> u16 {
    match code {
        "invalid_api_key" => 401,
        "rate_limit_exceeded" | "insufficient_quota" => 429,
        "server_error" => 500,
        _ => 400,
    }
}
