//! Input parameter tests.
//!
//! Tool arguments are one tolerant superset: only presence of `prompt` and
//! `output` is enforced locally, and options the chosen model does not accept
//! are dropped before the upstream request is built.

#[cfg(test)]
mod tests {
    use openai_image_mcp::options::GenerationRequest;
    use openai_image_mcp::ImageGenerateParams;
    use openai_image_mcp::server::{ignored_fields, parse_arguments};
    use openai_image_mcp_common::ImageModel;
    use serde_json::{Value, json};

    fn map(args: Value) -> ImageGenerateParams {
        parse_arguments(args.as_object().unwrap()).unwrap()
    }

    fn request_body(params: &ImageGenerateParams) -> Value {
        serde_json::to_value(GenerationRequest::new(&params.prompt, &params.options)).unwrap()
    }

    #[test]
    fn test_missing_prompt_fails_to_parse() {
        let args = json!({"output": "a.png"});
        assert!(parse_arguments(args.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_blank_prompt_fails_validation() {
        let params = map(json!({"prompt": "  ", "output": "a.png"}));
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("prompt"));
    }

    #[test]
    fn test_blank_output_fails_validation() {
        let params = map(json!({"prompt": "a cat", "output": ""}));
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("output"));
    }

    #[test]
    fn test_unknown_arguments_are_tolerated() {
        let params = map(json!({"prompt": "a cat", "output": "a.png", "negative_prompt": "dogs"}));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_values_are_not_validated_locally() {
        let params = map(json!({
            "prompt": "a cat",
            "output": "a.png",
            "model": "gpt-image-1",
            "size": "3x3",
            "output_compression": 500
        }));
        assert!(params.validate().is_ok());
        let body = request_body(&params);
        assert_eq!(body["size"], "3x3");
        assert_eq!(body["output_compression"], 500);
    }

    #[test]
    fn test_gpt_image_drops_dall_e_fields() {
        let args = json!({
            "prompt": "a cat",
            "output": "a.png",
            "model": "gpt-image-1",
            "style": "vivid",
            "response_format": "url",
            "background": "transparent"
        });
        let ignored = ignored_fields(args.as_object().unwrap(), ImageModel::GptImage1);
        assert_eq!(ignored, vec!["style", "response_format"]);

        let body = request_body(&map(args));
        assert!(body.get("style").is_none());
        assert!(body.get("response_format").is_none());
        assert_eq!(body["background"], "transparent");
    }

    #[test]
    fn test_wrongly_typed_fields_for_other_models_are_dropped() {
        let params = map(json!({
            "prompt": "a cat",
            "output": "a.png",
            "model": "gpt-image-1",
            "style": false,
            "response_format": 3
        }));
        let body = request_body(&params);
        assert!(body.get("style").is_none());
        assert!(body.get("response_format").is_none());
    }
}

#[cfg(test)]
mod property_tests {
    use openai_image_mcp::options::GenerationRequest;
    use openai_image_mcp::server::parse_arguments;
    use openai_image_mcp_common::ImageModel;
    use proptest::prelude::*;
    use serde_json::{Map, Value, json};

    /// Every option any model accepts, with a representative value.
    fn all_options() -> Map<String, Value> {
        json!({
            "n": 5,
            "size": "1024x1024",
            "quality": "high",
            "background": "transparent",
            "moderation": "low",
            "output_compression": 50,
            "output_format": "webp",
            "partial_images": 2,
            "stream": false,
            "style": "natural",
            "response_format": "b64_json",
            "user": "user-1"
        })
        .as_object()
        .cloned()
        .unwrap_or_default()
    }

    fn model_strategy() -> impl Strategy<Value = ImageModel> {
        prop::sample::select(ImageModel::ALL.to_vec())
    }

    proptest! {
        /// The request body only ever carries fields the selected model accepts.
        #[test]
        fn request_body_only_has_model_fields(
            model in model_strategy(),
            keep in prop::collection::vec(any::<bool>(), 12),
            prompt in "[a-zA-Z ]{1,40}",
        ) {
            let mut args: Map<String, Value> = all_options()
                .into_iter()
                .zip(keep)
                .filter_map(|(entry, keep)| keep.then_some(entry))
                .collect();
            args.insert("prompt".to_string(), json!(prompt));
            args.insert("output".to_string(), json!("out.png"));
            args.insert("model".to_string(), json!(model.as_str()));

            let params = parse_arguments(&args).unwrap();
            prop_assert_eq!(params.options.model(), model);

            let body = serde_json::to_value(GenerationRequest::new(&params.prompt, &params.options)).unwrap();
            for key in body.as_object().unwrap().keys() {
                let allowed = key == "model" || key == "prompt" || model.info().options.contains(&key.as_str())
                    || (model == ImageModel::DallE3 && key == "n");
                prop_assert!(allowed, "{} sent field {}", model, key);
            }
            if model == ImageModel::DallE3 {
                prop_assert_eq!(&body["n"], &json!(1));
            }
        }
    }
}
