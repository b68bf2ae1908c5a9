use std::fmt;

/// Failure taxonomy shared by every gateway capability.
///
/// Gateways map each raw transport failure to exactly one kind before it leaves
/// the gateway. Callers forward the kind and message; they never re-classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    AuthMissing,
    AuthRejected,
    RateLimited,
    ServiceUnavailable,
    SafetyRejected,
    MalformedResponse,
    UnsupportedInput,
    IoFailure,
    StorageFailure,
}

impl FailureKind {
    /// Returns true when a retry with backoff may succeed.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::RateLimited | Self::ServiceUnavailable)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthMissing => "auth_missing",
            Self::AuthRejected => "auth_rejected",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::SafetyRejected => "safety_rejected",
            Self::MalformedResponse => "malformed_response",
            Self::UnsupportedInput => "unsupported_input",
            Self::IoFailure => "io_failure",
            Self::StorageFailure => "storage_failure",
        }
    }

    fn headline(self) -> &'static str {
        match self {
            Self::AuthMissing => "No API key is configured. Set GEMINI_API_KEY and restart.",
            Self::AuthRejected => "The API key was rejected by the provider. Check the key and its permissions.",
            Self::RateLimited => "Rate limit reached. Wait a moment and try again.",
            Self::ServiceUnavailable => "The generation service is busy or unreachable. Try again shortly.",
            Self::SafetyRejected => "The request was blocked by the provider's safety filters. Modify the prompt or source and try again.",
            Self::MalformedResponse => "The provider did not return any media. Try again.",
            Self::UnsupportedInput => "This input is not supported for the selected operation.",
            Self::IoFailure => "The source file could not be read. Please select it again.",
            Self::StorageFailure => "The session could not be saved locally.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure of one gateway capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    kind: FailureKind,
    detail: String,
}

impl GenerationError {
    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn auth_missing() -> Self {
        Self::new(FailureKind::AuthMissing, "API key is not set")
    }

    #[must_use]
    pub fn unsupported(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::UnsupportedInput, detail)
    }

    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, detail)
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Provider- or caller-level detail, intended for logs.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// The single human-readable message shown to the user.
    ///
    /// Unsupported input carries caller-facing detail, so it is appended.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::UnsupportedInput if !self.detail.trim().is_empty() => {
                format!("{} ({})", self.kind.headline(), self.detail.trim())
            }
            _ => self.kind.headline().to_string(),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for GenerationError {}

/// A gateway could not be constructed from its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayInitError {
    message: String,
}

impl GatewayInitError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for GatewayInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GatewayInitError {}

impl From<String> for GatewayInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureKind, GenerationError};

    #[test]
    fn only_rate_limit_and_unavailable_are_transient() {
        let transient = [FailureKind::RateLimited, FailureKind::ServiceUnavailable];
        let permanent = [
            FailureKind::AuthMissing,
            FailureKind::AuthRejected,
            FailureKind::SafetyRejected,
            FailureKind::MalformedResponse,
            FailureKind::UnsupportedInput,
            FailureKind::IoFailure,
            FailureKind::StorageFailure,
        ];

        assert!(transient.iter().all(|kind| kind.is_transient()));
        assert!(permanent.iter().all(|kind| !kind.is_transient()));
    }

    #[test]
    fn user_message_hides_provider_detail_except_for_unsupported_input() {
        let rate = GenerationError::new(FailureKind::RateLimited, "RESOURCE_EXHAUSTED: quota 0");
        assert_eq!(
            rate.user_message(),
            "Rate limit reached. Wait a moment and try again."
        );

        let unsupported = GenerationError::unsupported("aspect ratio 21:9 is not available for video");
        assert!(unsupported
            .user_message()
            .ends_with("(aspect ratio 21:9 is not available for video)"));
    }

    #[test]
    fn display_includes_kind_and_detail() {
        let error = GenerationError::malformed("no inline data in candidate");
        assert_eq!(
            error.to_string(),
            "malformed_response: no inline data in candidate"
        );
    }
}
