//! Transport-only Gemini REST client primitives.
//!
//! This crate owns request building, response parsing and structured error
//! reporting for the `generateContent`, `predictLongRunning` and operation
//! polling endpoints. It performs no failure classification beyond surfacing the
//! provider's status code, status string and reason; mapping to a user-facing
//! taxonomy is the caller's job.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::{DownloadedMedia, GeminiApiClient};
pub use config::GeminiApiConfig;
pub use error::GeminiApiError;
pub use payload::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Operation, Part, PredictLongRunningRequest,
};
pub use retry::RetryPolicy;
pub use reqwest::StatusCode;
pub use url::normalize_base_url;
