use gemini_api::payload::Part;
use gemini_api::{GeminiApiClient, GeminiApiConfig, GenerateContentRequest};

#[test]
fn http_request_builds_generate_content_endpoint() {
    let config = GeminiApiConfig::new("test-key").with_base_url("https://proxy.local/v1beta/");
    let client = GeminiApiClient::new(config).expect("client");
    let request = GenerateContentRequest::user_turn(vec![Part::text("payload")], Some("sys"));

    let http_request = client
        .build_generate_content("gemini-2.5-flash-image", &request)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        http_request.url().as_str(),
        "https://proxy.local/v1beta/models/gemini-2.5-flash-image:generateContent"
    );
    assert_eq!(http_request.method(), "POST");
    let body = http_request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("json body");
    let json: serde_json::Value = serde_json::from_slice(body).expect("body is json");
    assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
}
