use gemini_api::payload::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, Operation, Part,
    PredictLongRunningRequest, VideoImage, VideoInstance, VideoParameters,
};
use serde_json::json;

#[test]
fn generate_content_request_uses_camel_case_wire_names() {
    let request = GenerateContentRequest::user_turn(
        vec![Part::text("make it warmer"), Part::inline("image/png", "AAAA")],
        Some("keep the composition"),
    )
    .with_generation_config(GenerationConfig::image(Some("16:9"), Some(7)));

    let value = serde_json::to_value(&request).expect("serialize request");

    assert_eq!(
        value,
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": "make it warmer"},
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
                ]
            }],
            "systemInstruction": {"parts": [{"text": "keep the composition"}]},
            "generationConfig": {
                "responseModalities": ["IMAGE", "TEXT"],
                "imageConfig": {"aspectRatio": "16:9"},
                "seed": 7
            }
        })
    );
}

#[test]
fn response_helpers_find_inline_media_text_and_feedback() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"text": "Here you go", "thought": false},
                {"thoughtSignature": "opaque"},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]},
            "finishReason": "STOP"
        }],
        "promptFeedback": {"blockReason": null},
        "usageMetadata": {"totalTokenCount": 12}
    }))
    .expect("response should deserialize");

    let media = response.first_inline_data().expect("inline data");
    assert_eq!(media.mime_type, "image/png");
    assert_eq!(response.text().as_deref(), Some("Here you go"));
    assert_eq!(response.finish_reason(), Some("STOP"));
    assert_eq!(response.block_reason(), None);
}

#[test]
fn blocked_prompt_response_has_no_candidates() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
        "promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}
    }))
    .expect("blocked response should deserialize");

    assert!(response.first_inline_data().is_none());
    assert_eq!(response.block_reason(), Some("PROHIBITED_CONTENT"));
    assert_eq!(response.text(), None);
}

#[test]
fn video_request_omits_unset_parameters() {
    let request = PredictLongRunningRequest {
        instances: vec![VideoInstance {
            prompt: "waves".to_string(),
            image: Some(VideoImage {
                bytes_base64_encoded: "AAAA".to_string(),
                mime_type: "image/jpeg".to_string(),
            }),
        }],
        parameters: VideoParameters {
            aspect_ratio: Some("9:16".to_string()),
            ..VideoParameters::default()
        },
    };

    assert_eq!(
        serde_json::to_value(&request).expect("serialize video request"),
        json!({
            "instances": [{
                "prompt": "waves",
                "image": {"bytesBase64Encoded": "AAAA", "mimeType": "image/jpeg"}
            }],
            "parameters": {"aspectRatio": "9:16"}
        })
    );
}

#[test]
fn finished_operation_exposes_video_uris() {
    let operation: Operation = serde_json::from_value(json!({
        "name": "models/veo/operations/op-1",
        "done": true,
        "response": {
            "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
            "generateVideoResponse": {
                "generatedSamples": [{"video": {"uri": "https://files.local/v1:download"}}]
            }
        }
    }))
    .expect("operation should deserialize");

    assert!(operation.done);
    assert_eq!(operation.video_uris(), vec!["https://files.local/v1:download"]);
    assert!(operation.filtered_reasons().is_empty());
}

#[test]
fn pending_operation_defaults_done_to_false() {
    let operation: Operation =
        serde_json::from_value(json!({"name": "models/veo/operations/op-2"}))
            .expect("pending operation should deserialize");

    assert!(!operation.done);
    assert!(operation.video_uris().is_empty());
}
