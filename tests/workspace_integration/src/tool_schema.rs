//! Tool schema validity tests.
//!
//! Every registered tool must carry a name, a description and an object
//! input schema; `generate_image` must require exactly `prompt` and `output`.

use serde_json::Value;

/// Validates that a JSON schema has the required structure.
fn validate_json_schema(schema: &Value) -> Result<(), String> {
    let obj = schema
        .as_object()
        .ok_or_else(|| "Schema must be an object".to_string())?;

    if let Some(type_val) = obj.get("type") {
        if type_val != "object" {
            return Err(format!("Expected type 'object', got {:?}", type_val));
        }
    }

    if let Some(properties) = obj.get("properties") {
        if !properties.is_object() {
            return Err("Properties must be an object".to_string());
        }
    }

    Ok(())
}

/// Validates that a tool has required fields.
fn validate_tool(tool: &rmcp::model::Tool) -> Result<(), String> {
    if tool.name.is_empty() {
        return Err("Tool name cannot be empty".to_string());
    }

    match &tool.description {
        Some(description) if !description.is_empty() => {}
        _ => return Err(format!("Tool '{}' must have a description", tool.name)),
    }

    if tool.input_schema.is_empty() {
        return Err(format!("Tool '{}' must have an input schema", tool.name));
    }

    let schema_value = serde_json::to_value(&*tool.input_schema)
        .map_err(|e| format!("Failed to serialize schema: {}", e))?;
    validate_json_schema(&schema_value)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openai_image_mcp::server::tools;
    use openai_image_mcp_common::ImageModel;
    use std::borrow::Cow;
    use std::sync::Arc;

    fn generate_image_schema() -> Value {
        let tools = tools();
        serde_json::to_value(&*tools[0].input_schema).unwrap()
    }

    #[test]
    fn test_json_schema_validation() {
        let valid_schema = serde_json::json!({
            "type": "object",
            "properties": {"prompt": {"type": "string"}},
            "required": ["prompt"]
        });
        assert!(validate_json_schema(&valid_schema).is_ok());

        let invalid_schema = serde_json::json!({"type": "string"});
        assert!(validate_json_schema(&invalid_schema).is_err());
    }

    #[test]
    fn test_tool_validation_rejects_missing_description() {
        let tool = rmcp::model::Tool {
            name: Cow::Borrowed("test_tool"),
            description: None,
            input_schema: Arc::new(
                serde_json::json!({"type": "object", "properties": {}})
                    .as_object()
                    .unwrap()
                    .clone(),
            ),
            annotations: None,
            icons: None,
            meta: None,
            output_schema: None,
            title: None,
        };
        assert!(validate_tool(&tool).is_err());
    }

    #[test]
    fn test_registered_tools_are_valid() {
        let tools = tools();
        assert_eq!(tools.len(), 1, "exactly one tool is registered");
        for tool in &tools {
            validate_tool(tool).unwrap();
        }
        assert_eq!(tools[0].name, "generate_image");
    }

    #[test]
    fn test_schema_lists_every_option() {
        let schema = generate_image_schema();
        let properties = schema["properties"].as_object().unwrap();
        for field in [
            "prompt",
            "output",
            "model",
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
        ] {
            assert!(properties.contains_key(field), "schema is missing '{}'", field);
        }
    }

    #[test]
    fn test_schema_required_set() {
        let schema = generate_image_schema();
        let mut required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        required.sort();
        assert_eq!(required, vec!["output", "prompt"]);
    }

    #[test]
    fn test_schema_model_enum() {
        let schema = generate_image_schema();
        let rendered = schema.to_string();
        for model in ImageModel::ALL {
            assert!(rendered.contains(model.as_str()), "schema is missing model {}", model);
        }
    }
}
