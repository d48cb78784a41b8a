//! OpenAI Image MCP Common Library
//!
//! Shared utilities for configuration, error handling, model definitions,
//! tracing, transports and the server lifecycle of the OpenAI image MCP server.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod framing;
pub mod lifecycle;
pub mod models;
pub mod server;
pub mod tracing;
pub mod transport;


pub use config::Config;
pub use error::{ConfigError, Error, Result, UpstreamErrorKind};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use models::{ImageModel, ModelRegistry};
pub use server::{McpServerBuilder, ServerError, shutdown_channel};
pub use transport::{Transport, TransportArgs, TransportMode};
