//! Provider-agnostic contract for generative media capabilities.
//!
//! This crate defines the artifact model, the failure taxonomy, and the async
//! capability surface a gateway exposes. It contains no transport details and no
//! session/history concerns.

mod artifact;
mod error;
mod mode;

use async_trait::async_trait;
use futures_util::future::try_join_all;

pub use artifact::{Artifact, ArtifactId, ArtifactPayload, LocalBinary, RemoteReference};
pub use error::{FailureKind, GatewayInitError, GenerationError};
pub use mode::{AspectRatio, EditingMode};

/// Upper bound for one batch request.
pub const MAX_BATCH_COUNT: usize = 8;

/// Input for instruction-driven edits of an existing image.
#[derive(Debug, Clone, PartialEq)]
pub struct EditImageInput {
    pub mode: EditingMode,
    pub source: Artifact,
    pub instruction: String,
    pub aspect_ratio: Option<AspectRatio>,
    /// Optional guide image sent after the source.
    pub reference: Option<Artifact>,
    pub pro: bool,
}

/// Input for text-to-image generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateImageInput {
    pub mode: EditingMode,
    pub instruction: String,
    pub aspect_ratio: Option<AspectRatio>,
    pub reference: Option<Artifact>,
    pub seed: Option<u64>,
    pub pro: bool,
}

/// Input for edits constrained to a masked region.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedEditInput {
    pub source: Artifact,
    pub mask: LocalBinary,
    pub instruction: String,
    pub pro: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoParams {
    pub duration_secs: Option<u32>,
    pub frame_rate: Option<u32>,
    /// 0.0 (static camera) to 1.0 (maximum motion).
    pub motion_strength: Option<f32>,
    pub seed: Option<u64>,
}

/// Input for video generation, optionally animating a source image.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateVideoInput {
    pub instruction: String,
    pub aspect_ratio: Option<AspectRatio>,
    pub source: Option<Artifact>,
    pub params: VideoParams,
}

/// Raw provider output, before it becomes an [`Artifact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedMedia {
    /// Inline base64 payload as returned by the provider.
    Encoded { mime_type: String, data: String },
    /// Bytes already fetched by the gateway (for example a downloaded video).
    Bytes { mime_type: String, bytes: Vec<u8> },
    /// Provider-hosted media that was not rehosted.
    Remote { url: String },
}

impl GeneratedMedia {
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Self::Encoded { mime_type, .. } | Self::Bytes { mime_type, .. } => Some(mime_type),
            Self::Remote { .. } => None,
        }
    }
}

/// Immutable metadata describing a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayProfile {
    pub provider_id: String,
    pub image_model: String,
    pub video_model: String,
    /// False when the gateway was built without a credential.
    pub authenticated: bool,
}

/// Capability surface of a generative media provider.
///
/// Every failure returned from a capability is already classified. Transient
/// failures have been retried by the time an error is returned.
#[async_trait]
pub trait MediaGateway: Send + Sync + 'static {
    fn profile(&self) -> GatewayProfile;

    async fn edit_image(&self, input: EditImageInput) -> Result<GeneratedMedia, GenerationError>;

    async fn generate_image(
        &self,
        input: GenerateImageInput,
    ) -> Result<GeneratedMedia, GenerationError>;

    /// Generates `count` sibling variants; the order of the result is history order.
    ///
    /// The default fans out `count` concurrent [`MediaGateway::generate_image`]
    /// calls and fails as a whole if any of them fails.
    async fn generate_batch(
        &self,
        input: GenerateImageInput,
        count: usize,
    ) -> Result<Vec<GeneratedMedia>, GenerationError> {
        if count == 0 || count > MAX_BATCH_COUNT {
            return Err(GenerationError::unsupported(format!(
                "batch count must be between 1 and {MAX_BATCH_COUNT}, got {count}"
            )));
        }

        let calls = (0..count).map(|index| {
            let mut variant = input.clone();
            variant.seed = input.seed.map(|seed| seed.wrapping_add(index as u64));
            self.generate_image(variant)
        });
        try_join_all(calls).await
    }

    async fn edit_with_mask(
        &self,
        input: MaskedEditInput,
    ) -> Result<GeneratedMedia, GenerationError>;

    async fn generate_video(
        &self,
        input: GenerateVideoInput,
    ) -> Result<GeneratedMedia, GenerationError>;

    async fn describe_image(&self, source: &Artifact) -> Result<String, GenerationError>;

    async fn extract_style(&self, source: &Artifact) -> Result<String, GenerationError>;

    async fn refine_prompt(&self, text: &str) -> Result<String, GenerationError>;

    /// Low-latency advisory preview. Never fails: any error yields `None`.
    async fn preview_fast(&self, instruction: &str) -> Option<GeneratedMedia>;
}
