//! MCP Server implementation for the image server.
//!
//! This module provides the MCP server handler that exposes:
//! - `generate_image` tool for text-to-image generation
//! - Resources for models and providers

use crate::handler::{ImageGenerateParams, ImageGenerateResult, ImageHandler};
use crate::options::GenerationOptions;
use crate::resources;
use openai_image_mcp_common::config::Config;
use openai_image_mcp_common::error::Error;
use openai_image_mcp_common::lifecycle::Lifecycle;
use openai_image_mcp_common::models::ImageModel;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolResult, Content, ErrorCode, InitializeRequestParam, InitializeResult, ListResourcesResult,
        ListToolsResult, ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo, Tool,
    },
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Name of the only tool this server exposes.
pub const GENERATE_IMAGE_TOOL: &str = "generate_image";

/// Optional tool arguments that are forwarded to some model.
const OPTION_FIELDS: &[&str] = &[
    "n",
    "size",
    "quality",
    "background",
    "moderation",
    "output_compression",
    "output_format",
    "partial_images",
    "stream",
    "style",
    "response_format",
    "user",
];

/// MCP Server for image generation.
#[derive(Clone)]
pub struct ImageServer {
    /// Handler for image generation, created on first use.
    /// Holding the lock serializes generations.
    handler: Arc<Mutex<Option<ImageHandler>>>,
    /// Server configuration
    config: Config,
    /// Process lifecycle, shared with the server builder
    lifecycle: Lifecycle,
}

/// Tool parameters for generate_image.
///
/// Describes the input schema: one flat object covering every model. Calls
/// are parsed with [`parse_arguments`], which ignores fields the selected model
/// does not accept.
#[derive(Debug, JsonSchema)]
pub struct GenerateImageToolParams {
    /// Text prompt describing the image to generate
    pub prompt: String,
    /// Output file path; several images get -1, -2, ... before the extension
    pub output: String,
    /// Model to use (default: dall-e-2)
    pub model: Option<ImageModel>,
    /// Number of images to generate (1-10; dall-e-3 always generates 1)
    #[schemars(range(min = 1, max = 10))]
    pub n: Option<u32>,
    /// Image size, e.g. 1024x1024 (allowed values depend on the model)
    pub size: Option<String>,
    /// Quality: auto/high/medium/low (gpt-image-1), standard/hd (dall-e-3)
    pub quality: Option<String>,
    /// Background: auto, transparent or opaque (gpt-image-1)
    pub background: Option<String>,
    /// Moderation level: auto or low (gpt-image-1)
    pub moderation: Option<String>,
    /// Compression level 0-100 for jpeg and webp output (gpt-image-1)
    #[schemars(range(min = 0, max = 100))]
    pub output_compression: Option<u32>,
    /// Output format: png, jpeg or webp (gpt-image-1)
    pub output_format: Option<String>,
    /// Number of partial images to stream, 0-3 (gpt-image-1)
    #[schemars(range(min = 0, max = 3))]
    pub partial_images: Option<u32>,
    /// Stream partial images as they are generated (gpt-image-1)
    pub stream: Option<bool>,
    /// Style: vivid or natural (dall-e-3)
    pub style: Option<String>,
    /// Response format: url or b64_json (dall-e-2, dall-e-3)
    pub response_format: Option<String>,
    /// End-user identifier for abuse monitoring
    pub user: Option<String>,
}

/// Arguments read for every model.
#[derive(Debug, Deserialize)]
struct CommonArguments {
    prompt: String,
    output: String,
    #[serde(default)]
    model: Option<ImageModel>,
}

/// Build generation parameters from raw `generate_image` arguments.
///
/// The selected model decides which option fields are read. Fields meant for
/// other models are never inspected, so their values cannot fail the call.
pub fn parse_arguments(args: &Map<String, Value>) -> Result<ImageGenerateParams, serde_json::Error> {
    let common: CommonArguments = serde_json::from_value(Value::Object(args.clone()))?;
    let model = common.model.unwrap_or_default();

    Ok(ImageGenerateParams {
        prompt: common.prompt,
        output: common.output,
        options: GenerationOptions::from_arguments(model, args)?,
    })
}

/// Option arguments present in `args` that `model` does not accept.
pub fn ignored_fields(args: &Map<String, Value>, model: ImageModel) -> Vec<&'static str> {
    OPTION_FIELDS
        .iter()
        .copied()
        .filter(|field| args.get(*field).is_some_and(|v| !v.is_null()))
        .filter(|field| !model.info().options.contains(field))
        .collect()
}

/// Reject a missing, non-string or blank argument.
fn require_text(args: &Map<String, Value>, field: &str) -> Result<(), McpError> {
    match args.get(field).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(McpError::invalid_params(
            format!("'{}' is required and must be a non-empty string", field),
            None,
        )),
    }
}

/// Tool descriptors exposed by this server.
pub fn tools() -> Vec<Tool> {
    use schemars::schema_for;

    let schema = schema_for!(GenerateImageToolParams);
    let schema_value = serde_json::to_value(&schema).unwrap_or_default();
    let input_schema = match schema_value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(Map::new()),
    };

    vec![Tool {
        name: Cow::Borrowed(GENERATE_IMAGE_TOOL),
        description: Some(Cow::Borrowed(
            "Generate images from a text prompt using the OpenAI Images API \
             (gpt-image-1, dall-e-3 or dall-e-2) and save them to the given output path. \
             Options the selected model does not support are ignored. \
             Returns the saved file paths and the API response metadata.",
        )),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema: None,
        title: None,
    }]
}

impl ImageServer {
    /// Create a new ImageServer with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            handler: Arc::new(Mutex::new(None)),
            config,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Share `lifecycle` with the server builder.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// The lifecycle this server reports to.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Generate images, one request at a time.
    pub async fn generate_image(&self, params: ImageGenerateParams) -> Result<ImageGenerateResult, Error> {
        info!(prompt = %params.prompt, output = %params.output, "Generating image");

        let mut handler = self.handler.lock().await;
        if handler.is_none() {
            *handler = Some(ImageHandler::new(self.config.clone())?);
        }
        let handler = handler
            .as_ref()
            .ok_or_else(|| Error::validation("Handler not initialized"))?;

        handler.generate_image(params).await
    }

    async fn call_generate_image(
        &self,
        arguments: Option<Map<String, Value>>,
        context: &rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = arguments.unwrap_or_default();
        require_text(&args, "prompt")?;
        require_text(&args, "output")?;

        let params = parse_arguments(&args)
            .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))?;

        let model = params.options.model();
        let ignored = ignored_fields(&args, model);
        if !ignored.is_empty() {
            debug!(model = %model, ignored = ?ignored, "Ignoring options the model does not accept");
        }

        if self.lifecycle.is_stopping() {
            return Ok(CallToolResult::error(vec![Content::text(
                "Image generation failed: server is shutting down",
            )]));
        }

        let result = tokio::select! {
            result = self.generate_image(params) => result,
            _ = context.ct.cancelled() => {
                info!("Image generation cancelled");
                return Ok(CallToolResult::error(vec![Content::text(
                    "Image generation cancelled",
                )]));
            }
        };

        match result {
            Ok(result) => {
                let text = serde_json::to_string_pretty(&result)
                    .map_err(|e| McpError::internal_error(format!("Failed to serialize result: {}", e), None))?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                warn!(error = %e, "Image generation failed");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Image generation failed: {}",
                    e
                ))]))
            }
        }
    }
}

impl ServerHandler for ImageServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Image generation server using the OpenAI Images API. \
                 Use generate_image to create images from text prompts and save them locally."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    fn initialize(
        &self,
        request: InitializeRequestParam,
        context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<InitializeResult, McpError>> + Send + '_ {
        info!(
            protocol_version = ?request.protocol_version,
            client = %request.client_info.name,
            "Client initializing"
        );

        if context.peer.peer_info().is_none() {
            context.peer.set_peer_info(request);
        }
        if !self.lifecycle.mark_ready() {
            debug!(state = ?self.lifecycle.state(), "Initialize received outside of startup");
        }

        std::future::ready(Ok(self.get_info()))
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: tools(),
            next_cursor: None,
            meta: None,
        }))
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            match params.name.as_ref() {
                GENERATE_IMAGE_TOOL => self.call_generate_image(params.arguments, &context).await,
                _ => Err(McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("Unknown tool: {}", params.name),
                    None,
                )),
            }
        }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resources");

            let models_resource = rmcp::model::Resource {
                raw: rmcp::model::RawResource {
                    uri: resources::MODELS_URI.to_string(),
                    name: "Available Image Models".to_string(),
                    title: None,
                    description: Some("Image models with their sizes, qualities and accepted options".to_string()),
                    mime_type: Some("application/json".to_string()),
                    size: None,
                    icons: None,
                    meta: None,
                },
                annotations: None,
            };

            let providers_resource = rmcp::model::Resource {
                raw: rmcp::model::RawResource {
                    uri: resources::PROVIDERS_URI.to_string(),
                    name: "Available Providers".to_string(),
                    title: None,
                    description: Some("List of available image generation providers".to_string()),
                    mime_type: Some("application/json".to_string()),
                    size: None,
                    icons: None,
                    meta: None,
                },
                annotations: None,
            };

            Ok(ListResourcesResult {
                resources: vec![models_resource, providers_resource],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            let content = match uri.as_str() {
                resources::MODELS_URI => resources::models_resource_json(),
                resources::PROVIDERS_URI => resources::providers_resource_json(),
                _ => {
                    return Err(McpError::resource_not_found(
                        format!("Unknown resource: {}", uri),
                        None,
                    ));
                }
            };

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(content, uri.clone())],
            })
        }
    }
}
