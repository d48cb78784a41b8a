//! Workspace-level integration tests for the OpenAI image MCP server.
//!
//! These tests verify:
//! - The server can be constructed and advertises tools and resources
//! - Tool registration and schema generation
//! - Property-based tests for argument mapping and the tool output format

pub mod input_validation;
pub mod output_format;
pub mod server_startup;
pub mod tool_schema;
