//! Output format tests.
//!
//! A successful `generate_image` call returns one text content item holding a
//! JSON document with `savedFiles` and `response`; a failed call returns a
//! text message with `isError` set.

use openai_image_mcp::ImageGenerateResult;
use rmcp::model::{CallToolResult, Content, RawContent};
use serde_json::Value;

/// Build the tool result the server returns for a successful generation.
fn success_result(result: &ImageGenerateResult) -> CallToolResult {
    let text = serde_json::to_string_pretty(result).unwrap_or_default();
    CallToolResult::success(vec![Content::text(text)])
}

/// Validates that a CallToolResult has valid content format.
fn validate_tool_result(result: &CallToolResult) -> Result<(), String> {
    if result.content.is_empty() {
        return Err("Result should have content".to_string());
    }

    for content in &result.content {
        match &content.raw {
            RawContent::Text(text) if !text.text.is_empty() => {}
            RawContent::Text(_) => return Err("Text content should not be empty".to_string()),
            _ => return Err("Only text content is produced".to_string()),
        }
    }

    Ok(())
}

/// Validates the JSON payload of a successful result.
fn validate_success_payload(result: &CallToolResult) -> Result<Value, String> {
    validate_tool_result(result)?;
    if result.is_error == Some(true) {
        return Err("Successful result must not be flagged as an error".to_string());
    }

    let text = match &result.content[0].raw {
        RawContent::Text(text) => text.text.clone(),
        _ => return Err("Expected text content".to_string()),
    };
    let payload: Value = serde_json::from_str(&text).map_err(|e| format!("Payload is not JSON: {}", e))?;

    let files = payload["savedFiles"]
        .as_array()
        .ok_or_else(|| "Payload must list savedFiles".to_string())?;
    for file in files {
        if file["path"].as_str().is_none_or(str::is_empty) {
            return Err("Every saved file needs a path".to_string());
        }
        if !file["index"].is_u64() {
            return Err("Every saved file needs an index".to_string());
        }
    }
    if !payload["response"].is_object() {
        return Err("Payload must echo the response metadata".to_string());
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openai_image_mcp::SavedFile;
    use serde_json::json;

    fn saved(path: &str, index: usize, partial: bool) -> SavedFile {
        SavedFile {
            path: path.to_string(),
            index,
            partial,
        }
    }

    #[test]
    fn test_success_payload_shape() {
        let result = ImageGenerateResult {
            saved_files: vec![saved("out-1.png", 1, false), saved("out-2.png", 2, false)],
            response: json!({"created": 1700000000}),
            incomplete: None,
        };

        let payload = validate_success_payload(&success_result(&result)).unwrap();
        assert_eq!(payload["savedFiles"][1]["path"], "out-2.png");
        assert!(payload.get("incomplete").is_none());
    }

    #[test]
    fn test_incomplete_result_is_still_a_success() {
        let result = ImageGenerateResult {
            saved_files: vec![saved("out-partial-1.png", 1, true)],
            response: json!({}),
            incomplete: Some("Image stream interrupted".to_string()),
        };

        let payload = validate_success_payload(&success_result(&result)).unwrap();
        assert_eq!(payload["incomplete"], "Image stream interrupted");
        assert_eq!(payload["savedFiles"][0]["partial"], true);
    }

    #[test]
    fn test_error_result_carries_message() {
        let result = CallToolResult::error(vec![Content::text("Image generation failed: boom")]);
        assert!(validate_tool_result(&result).is_ok());
        assert_eq!(result.is_error, Some(true));
        assert!(validate_success_payload(&result).is_err());
    }

    #[test]
    fn test_empty_text_fails_validation() {
        let result = CallToolResult::success(vec![Content::text("")]);
        assert!(validate_tool_result(&result).is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use openai_image_mcp::SavedFile;
    use proptest::prelude::*;

    fn saved_files_strategy() -> impl Strategy<Value = Vec<SavedFile>> {
        prop::collection::vec(("[a-z]{1,10}", any::<bool>()), 1..6).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (stem, partial))| SavedFile {
                    path: format!("{}-{}.png", stem, i + 1),
                    index: i + 1,
                    partial,
                })
                .collect()
        })
    }

    proptest! {
        /// Any generation result renders as a valid success payload listing every file.
        #[test]
        fn success_payload_lists_every_file(files in saved_files_strategy(), created in any::<u32>()) {
            let result = ImageGenerateResult {
                saved_files: files.clone(),
                response: serde_json::json!({"created": created}),
                incomplete: None,
            };

            let payload = validate_success_payload(&success_result(&result)).unwrap();
            let listed = payload["savedFiles"].as_array().unwrap();
            prop_assert_eq!(listed.len(), files.len());
            for (entry, file) in listed.iter().zip(&files) {
                prop_assert_eq!(entry["path"].as_str(), Some(file.path.as_str()));
                prop_assert_eq!(entry.get("partial").is_some(), file.partial);
            }
        }
    }
}
