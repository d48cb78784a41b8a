//! Tracing initialization for the MCP server.
//!
//! Logs always go to **stderr**: in stdio mode stdout carries the JSON-RPC
//! channel and must only ever contain protocol messages.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls the log level and filtering. Examples:
//!   - `RUST_LOG=debug` - Enable debug logging for all modules
//!   - `RUST_LOG=openai_image_mcp=debug` - Enable debug for the server crate
//!   - `RUST_LOG=warn,openai_image_mcp_common=debug` - Warn by default, debug for common

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Filtering comes from `RUST_LOG` and defaults to `info`.
///
/// # Panics
///
/// Panics if a global subscriber is already set.
///
/// # Example
///
/// ```no_run
/// use openai_image_mcp_common::tracing::init_tracing;
///
/// fn main() {
///     init_tracing();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(stderr_layer())
        .init();
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
}
