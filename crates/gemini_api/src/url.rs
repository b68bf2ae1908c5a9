/// Default versioned API root for Gemini transport requests.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Normalize a configured base URL.
///
/// Normalization rules:
/// 1) blank input falls back to [`DEFAULT_GEMINI_BASE_URL`]
/// 2) trailing slashes are removed
/// 3) a trailing `/models` segment is dropped so endpoints can append it
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_GEMINI_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    trimmed
        .strip_suffix("/models")
        .unwrap_or(trimmed)
        .to_string()
}

/// `{base}/models/{model}:{method}`
pub fn model_endpoint(base_url: &str, model: &str, method: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    format!("{}/models/{model}:{method}", normalize_base_url(base_url))
}

/// Operation names are returned fully qualified (`models/.../operations/...`).
pub fn operation_endpoint(base_url: &str, operation_name: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        operation_name.trim().trim_start_matches('/')
    )
}
