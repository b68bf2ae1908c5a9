//! The one place where Gemini transport failures become [`FailureKind`]s.

use gemini_api::retry::is_retryable_http_status;
use gemini_api::{GeminiApiError, GenerateContentResponse, Operation};
use media_provider::{FailureKind, GeneratedMedia, GenerationError};

/// Finish and block reasons that mean the provider's content filters fired.
const SAFETY_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
];

const AUTH_REASONS: &[&str] = &["API_KEY_INVALID", "API_KEY_EXPIRED", "API_KEY_SERVICE_BLOCKED"];

pub fn transport_error(error: &GeminiApiError) -> GenerationError {
    GenerationError::new(kind_for(error), error.to_string())
}

#[must_use]
pub fn kind_for(error: &GeminiApiError) -> FailureKind {
    match error {
        GeminiApiError::MissingApiKey => FailureKind::AuthMissing,
        GeminiApiError::InvalidBaseUrl(_) | GeminiApiError::Unknown(_) => {
            FailureKind::UnsupportedInput
        }
        GeminiApiError::Request(inner) if inner.is_decode() => FailureKind::MalformedResponse,
        GeminiApiError::Request(inner) => match inner.status() {
            Some(status) => status_kind(status.as_u16(), None, None),
            None => FailureKind::ServiceUnavailable,
        },
        GeminiApiError::Status {
            status,
            provider_status,
            reason,
            ..
        } => status_kind(status.as_u16(), provider_status.as_deref(), reason.as_deref()),
        GeminiApiError::Serde(_) => FailureKind::MalformedResponse,
        GeminiApiError::OperationFailed { code, .. } => operation_kind(*code),
    }
}

fn status_kind(status: u16, provider_status: Option<&str>, reason: Option<&str>) -> FailureKind {
    if reason.is_some_and(|reason| AUTH_REASONS.contains(&reason)) {
        return FailureKind::AuthRejected;
    }

    match provider_status {
        Some("UNAUTHENTICATED" | "PERMISSION_DENIED") => return FailureKind::AuthRejected,
        Some("RESOURCE_EXHAUSTED") => return FailureKind::RateLimited,
        Some("UNAVAILABLE" | "INTERNAL" | "DEADLINE_EXCEEDED") => {
            return FailureKind::ServiceUnavailable
        }
        _ => {}
    }

    match status {
        401 | 403 => FailureKind::AuthRejected,
        429 => FailureKind::RateLimited,
        status if is_retryable_http_status(status) => FailureKind::ServiceUnavailable,
        400..=499 => FailureKind::UnsupportedInput,
        500..=599 => FailureKind::ServiceUnavailable,
        _ => FailureKind::MalformedResponse,
    }
}

/// `google.rpc.Code` values carried by failed long-running operations.
fn operation_kind(code: Option<i32>) -> FailureKind {
    match code {
        Some(3 | 9 | 11) => FailureKind::UnsupportedInput,
        Some(7 | 16) => FailureKind::AuthRejected,
        Some(8) => FailureKind::RateLimited,
        Some(4 | 13 | 14) => FailureKind::ServiceUnavailable,
        _ => FailureKind::MalformedResponse,
    }
}

#[must_use]
pub fn is_safety_reason(reason: &str) -> bool {
    SAFETY_REASONS.contains(&reason)
}

/// First inline media of a `generateContent` response.
pub fn media_from_response(
    response: &GenerateContentResponse,
) -> Result<GeneratedMedia, GenerationError> {
    reject_blocked(response)?;

    if let Some(inline) = response.first_inline_data() {
        if inline.data.trim().is_empty() {
            return Err(GenerationError::malformed("inline media part is empty"));
        }
        return Ok(GeneratedMedia::Encoded {
            mime_type: inline.mime_type.clone(),
            data: inline.data.clone(),
        });
    }

    Err(GenerationError::malformed(match response.text() {
        Some(text) => format!("response carried text but no media: {}", clip(&text)),
        None => "response carried no media".to_string(),
    }))
}

/// Concatenated text of a `generateContent` response.
pub fn text_from_response(response: &GenerateContentResponse) -> Result<String, GenerationError> {
    reject_blocked(response)?;
    response
        .text()
        .map(|text| text.trim().to_string())
        .ok_or_else(|| GenerationError::malformed("response carried no text"))
}

/// Failure for a finished video operation that produced no sample.
pub fn empty_video(operation: &Operation) -> GenerationError {
    let filtered = operation.filtered_reasons();
    if filtered.is_empty() {
        GenerationError::malformed(format!("operation {} finished without video", operation.name))
    } else {
        GenerationError::new(FailureKind::SafetyRejected, filtered.join("; "))
    }
}

fn reject_blocked(response: &GenerateContentResponse) -> Result<(), GenerationError> {
    if let Some(reason) = response.block_reason() {
        return Err(GenerationError::new(
            FailureKind::SafetyRejected,
            format!("prompt blocked: {reason}"),
        ));
    }

    // A safety finish only matters when nothing usable came back.
    match response.finish_reason() {
        Some(reason) if is_safety_reason(reason) && response.first_inline_data().is_none() => {
            Err(GenerationError::new(
                FailureKind::SafetyRejected,
                format!("generation stopped: {reason}"),
            ))
        }
        _ => Ok(()),
    }
}

fn clip(text: &str) -> String {
    const LIMIT: usize = 160;
    match text.char_indices().nth(LIMIT) {
        Some((index, _)) => format!("{}…", &text[..index]),
        None => text.to_string(),
    }
}
