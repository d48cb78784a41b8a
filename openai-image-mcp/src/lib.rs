//! OpenAI Image MCP Server Library
//!
//! This library provides image generation over MCP using the OpenAI Images API.

pub mod handler;
pub mod options;
pub mod resources;
pub mod server;
pub mod source;

pub use handler::{ImageGenerateParams, ImageGenerateResult, ImageHandler, SavedFile};
pub use options::GenerationOptions;
pub use server::{GenerateImageToolParams, ImageServer};
