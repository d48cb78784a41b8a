//! OpenAI Image MCP Server
//!
//! MCP server for image generation using the OpenAI Images API.

use anyhow::Result;
use clap::Parser;
use openai_image_mcp::ImageServer;
use openai_image_mcp_common::tracing::init_tracing;
use openai_image_mcp_common::{Config, Lifecycle, McpServerBuilder, TransportArgs};

/// Command-line arguments for the image server.
#[derive(Parser, Debug)]
#[command(name = "openai-image-mcp")]
#[command(about = "MCP server for image generation using the OpenAI Images API")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG may only be set in .env
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("openai-image-mcp server starting...");

    // Parse command-line arguments
    let args = Args::parse();

    // Missing credentials are fatal before any transport is opened
    let config = Config::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
    })?;
    tracing::info!(
        base_url = %config.base_url,
        timeout_secs = config.request_timeout_secs,
        "Configuration loaded"
    );

    let lifecycle = Lifecycle::new();
    let server = ImageServer::new(config).with_lifecycle(lifecycle.clone());

    let transport = args.transport.into_transport();

    McpServerBuilder::new(server)
        .with_transport(transport)
        .with_lifecycle(lifecycle)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
