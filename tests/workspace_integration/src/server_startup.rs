//! Server startup integration tests.
//!
//! Checks that the server can be instantiated without touching the network and
//! that it advertises the capabilities clients rely on.

use openai_image_mcp_common::Config;

/// Configuration with a fake key, as used by every startup test.
fn test_config() -> Config {
    Config::new("sk-test-key")
}

#[cfg(test)]
mod tests {
    use super::*;
    use openai_image_mcp::ImageServer;
    use openai_image_mcp_common::{Lifecycle, LifecycleState};
    use rmcp::ServerHandler;

    #[test]
    fn test_image_server_startup() {
        let server = ImageServer::new(test_config());
        let info = server.get_info();

        let instructions = info.instructions.as_ref().unwrap().to_lowercase();
        assert!(
            instructions.contains("image"),
            "Server instructions should mention 'image'"
        );
    }

    #[test]
    fn test_server_has_tools_and_resources_capability() {
        let info = ImageServer::new(test_config()).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }

    #[test]
    fn test_server_starts_uninitialized() {
        let lifecycle = Lifecycle::new();
        let server = ImageServer::new(test_config()).with_lifecycle(lifecycle.clone());

        assert_eq!(server.lifecycle().state(), LifecycleState::Uninitialized);
        assert!(!lifecycle.is_ready());
    }

    #[test]
    fn test_server_is_cloneable() {
        let server = ImageServer::new(test_config());
        let clone = server.clone();
        assert_eq!(
            server.get_info().instructions,
            clone.get_info().instructions
        );
    }

    #[test]
    fn test_config_debug_hides_key() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("sk-test-key"));
    }
}
