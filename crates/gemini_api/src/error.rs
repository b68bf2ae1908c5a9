use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum GeminiApiError {
    MissingApiKey,
    InvalidBaseUrl(String),
    Request(reqwest::Error),
    /// Non-success HTTP response, with whatever structure the error body carried.
    Status {
        status: StatusCode,
        /// Canonical provider status, e.g. `RESOURCE_EXHAUSTED`.
        provider_status: Option<String>,
        /// `ErrorInfo.reason` from the error details, e.g. `API_KEY_INVALID`.
        reason: Option<String>,
        message: String,
    },
    Serde(JsonError),
    /// A long-running operation finished with an error payload.
    OperationFailed {
        code: Option<i32>,
        message: String,
    },
    Unknown(String),
}

impl GeminiApiError {
    /// Connection and timeout failures are worth another attempt.
    #[must_use]
    pub fn is_transient_transport(&self) -> bool {
        match self {
            Self::Request(error) => error.is_connect() || error.is_timeout(),
            _ => false,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(error) => error.status(),
            _ => None,
        }
    }
}

impl fmt::Display for GeminiApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "API key is required"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status {
                status,
                provider_status,
                message,
                ..
            } => match provider_status {
                Some(provider_status) => write!(f, "HTTP {status} {provider_status}: {message}"),
                None => write!(f, "HTTP {status} {message}"),
            },
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::OperationFailed { code, message } => match code {
                Some(code) => write!(f, "operation failed ({code}): {message}"),
                None => write!(f, "operation failed: {message}"),
            },
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for GeminiApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeminiApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for GeminiApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayloadFields {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Builds a structured [`GeminiApiError::Status`] from an HTTP error response.
///
/// Google APIs return `{"error": {"code", "message", "status", "details"}}`;
/// bodies that do not parse fall back to the raw text or the canonical reason.
pub fn status_error(status: StatusCode, body: &str) -> GeminiApiError {
    let parsed = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.error);

    let fallback = || {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.trim().to_string()
        }
    };

    let Some(fields) = parsed else {
        return GeminiApiError::Status {
            status,
            provider_status: None,
            reason: None,
            message: fallback(),
        };
    };

    let reason = fields
        .details
        .into_iter()
        .find_map(|detail| detail.reason.and_then(non_empty));
    GeminiApiError::Status {
        status,
        provider_status: fields.status.and_then(non_empty),
        reason,
        message: fields
            .message
            .and_then(non_empty)
            .unwrap_or_else(fallback),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
