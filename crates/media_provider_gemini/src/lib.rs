//! Gemini-backed implementation of the `media_provider` capability contract.
//!
//! Requests are built here, sent through `gemini_api`, and every failure is
//! classified once by [`classify`] before it leaves the gateway.

pub mod classify;
pub mod protocols;
mod transport;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use gemini_api::payload::{VideoImage, VideoInstance, VideoParameters};
use gemini_api::retry::retry_with_backoff;
use gemini_api::{
    GeminiApiClient, GeminiApiConfig, GeminiApiError, GenerateContentRequest, GenerationConfig,
    Part, PredictLongRunningRequest, RetryPolicy,
};
use media_provider::{
    Artifact, AspectRatio, EditImageInput, GatewayInitError, GatewayProfile, GenerateImageInput,
    GenerateVideoInput, GeneratedMedia, GenerationError, LocalBinary, MaskedEditInput,
    MediaGateway, VideoParams,
};

use crate::transport::{DefaultTransport, GeminiTransport};

/// Stable provider identifier used by startup selection.
pub const GEMINI_PROVIDER_ID: &str = "gemini";

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_PRO_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_PREVIEW_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.0-generate-001";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const PREVIEW_RETRY_DELAY: Duration = Duration::from_millis(300);

const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Runtime configuration for the Gemini gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiGatewayConfig {
    /// `None` or blank degrades every capability to `AuthMissing`.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    pub image_model: String,
    pub pro_image_model: String,
    pub text_model: String,
    pub preview_model: String,
    pub video_model: String,
    pub retry: RetryPolicy,
    pub preview_retry: RetryPolicy,
    pub poll_interval: Duration,
}

impl Default for GeminiGatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: None,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            pro_image_model: DEFAULT_PRO_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            preview_model: DEFAULT_PREVIEW_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            retry: RetryPolicy::default(),
            preview_retry: RetryPolicy::fixed(1, PREVIEW_RETRY_DELAY),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl GeminiGatewayConfig {
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    fn into_api_config(self, api_key: &str) -> GeminiApiConfig {
        let mut config = GeminiApiConfig::new(api_key)
            .with_user_agent(concat!("retouch/", env!("CARGO_PKG_VERSION")));

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

/// `MediaGateway` backed by the Gemini REST API.
pub struct GeminiGateway {
    config: GeminiGatewayConfig,
    transport: Option<Arc<dyn GeminiTransport>>,
}

impl GeminiGateway {
    /// Builds the gateway. A missing key is not an error here: the gateway is
    /// created unauthenticated and every capability reports `AuthMissing`.
    pub fn new(config: GeminiGatewayConfig) -> Result<Self, GatewayInitError> {
        let transport = match config.api_key() {
            Some(api_key) => {
                let client = GeminiApiClient::new(config.clone().into_api_config(api_key))
                    .map_err(map_init_error)?;
                Some(Arc::new(DefaultTransport { client }) as Arc<dyn GeminiTransport>)
            }
            None => {
                tracing::warn!("no Gemini API key configured; generation is disabled");
                None
            }
        };

        Ok(Self { config, transport })
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.transport.is_some()
    }

    #[must_use]
    pub fn config(&self) -> &GeminiGatewayConfig {
        &self.config
    }

    #[cfg(test)]
    fn with_transport_for_tests(
        config: GeminiGatewayConfig,
        transport: Arc<dyn GeminiTransport>,
    ) -> Self {
        Self {
            config,
            transport: Some(transport),
        }
    }

    fn transport(&self) -> Result<&Arc<dyn GeminiTransport>, GenerationError> {
        self.transport.as_ref().ok_or_else(GenerationError::auth_missing)
    }

    fn image_model(&self, pro: bool) -> &str {
        if pro {
            &self.config.pro_image_model
        } else {
            &self.config.image_model
        }
    }

    async fn request_media(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GeneratedMedia, GenerationError> {
        let transport = self.transport()?;
        let request = &request;
        tracing::debug!(model, parts = request.contents[0].parts.len(), "requesting media");

        let response = with_retry(self.config.retry, move || {
            transport.generate_content(model, request)
        })
        .await;
        let media = response.and_then(|response| classify::media_from_response(&response));
        if let Err(error) = &media {
            tracing::warn!(model, kind = %error.kind(), detail = error.detail(), "media request failed");
        }
        media
    }

    async fn request_text(
        &self,
        protocol: &str,
        parts: Vec<Part>,
    ) -> Result<String, GenerationError> {
        let transport = self.transport()?;
        let model = self.config.text_model.as_str();
        let request = GenerateContentRequest::user_turn(parts, Some(protocol));
        let request = &request;

        let response = with_retry(self.config.retry, move || {
            transport.generate_content(model, request)
        })
        .await?;
        classify::text_from_response(&response)
    }
}

#[async_trait]
impl MediaGateway for GeminiGateway {
    fn profile(&self) -> GatewayProfile {
        GatewayProfile {
            provider_id: GEMINI_PROVIDER_ID.to_string(),
            image_model: self.config.image_model.clone(),
            video_model: self.config.video_model.clone(),
            authenticated: self.is_authenticated(),
        }
    }

    async fn edit_image(&self, input: EditImageInput) -> Result<GeneratedMedia, GenerationError> {
        self.transport()?;
        let source = image_source(&input.source, "source")?;

        let mut parts = vec![inline_part(source)];
        if let Some(reference) = &input.reference {
            parts.push(inline_part(image_source(reference, "reference")?));
        }
        parts.push(Part::text(input.instruction));

        let request =
            GenerateContentRequest::user_turn(parts, Some(protocols::for_mode(input.mode)))
                .with_generation_config(GenerationConfig::image(
                    input.aspect_ratio.map(AspectRatio::as_str),
                    None,
                ));
        self.request_media(self.image_model(input.pro), request).await
    }

    async fn generate_image(
        &self,
        input: GenerateImageInput,
    ) -> Result<GeneratedMedia, GenerationError> {
        self.transport()?;

        let mut parts = Vec::with_capacity(2);
        if let Some(reference) = &input.reference {
            parts.push(inline_part(image_source(reference, "reference")?));
        }
        parts.push(Part::text(input.instruction));

        let request =
            GenerateContentRequest::user_turn(parts, Some(protocols::for_mode(input.mode)))
                .with_generation_config(GenerationConfig::image(
                    input.aspect_ratio.map(AspectRatio::as_str),
                    input.seed,
                ));
        self.request_media(self.image_model(input.pro), request).await
    }

    async fn edit_with_mask(
        &self,
        input: MaskedEditInput,
    ) -> Result<GeneratedMedia, GenerationError> {
        self.transport()?;
        let source = image_source(&input.source, "source")?;
        if input.mask.bytes().is_empty() {
            return Err(GenerationError::unsupported("mask is empty"));
        }

        let parts = vec![
            inline_part(source),
            inline_part(&input.mask),
            Part::text(input.instruction),
        ];
        let request = GenerateContentRequest::user_turn(parts, Some(protocols::INPAINT))
            .with_generation_config(GenerationConfig::image(None, None));
        self.request_media(self.image_model(input.pro), request).await
    }

    async fn generate_video(
        &self,
        input: GenerateVideoInput,
    ) -> Result<GeneratedMedia, GenerationError> {
        let transport = self.transport()?;
        let aspect_ratio = input.aspect_ratio.unwrap_or(AspectRatio::Landscape16x9);
        if !aspect_ratio.supports_video() {
            return Err(GenerationError::unsupported(format!(
                "aspect ratio {aspect_ratio} is not available for video, use 16:9 or 9:16"
            )));
        }
        validate_video_params(&input.params)?;

        let image = match &input.source {
            Some(source) => {
                let binary = image_source(source, "video source")?;
                Some(VideoImage {
                    bytes_base64_encoded: BASE64_STANDARD.encode(binary.bytes()),
                    mime_type: binary.mime_type().to_string(),
                })
            }
            None => None,
        };
        let request = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: video_prompt(&input.instruction, &input.params),
                image,
            }],
            parameters: VideoParameters {
                aspect_ratio: Some(aspect_ratio.as_str().to_string()),
                duration_seconds: input.params.duration_secs,
                seed: input.params.seed,
            },
        };
        let request = &request;
        let model = self.config.video_model.as_str();

        let mut operation = with_retry(self.config.retry, move || {
            transport.start_video(model, request)
        })
        .await?;
        if !operation.done && operation.name.trim().is_empty() {
            return Err(GenerationError::malformed("video job returned no operation name"));
        }
        tracing::info!(operation = %operation.name, model, "video generation started");

        let mut polls = 0_u32;
        while !operation.done {
            tokio::time::sleep(self.config.poll_interval).await;
            polls += 1;

            let name = operation.name.clone();
            let name = name.as_str();
            operation = with_retry(self.config.retry, move || transport.poll_operation(name)).await?;
            tracing::debug!(operation = name, polls, done = operation.done, "polled video job");
        }

        let Some(uri) = operation.video_uris().first().map(|uri| uri.to_string()) else {
            return Err(classify::empty_video(&operation));
        };
        let uri = uri.as_str();
        let downloaded = with_retry(self.config.retry, move || transport.download(uri)).await?;
        if downloaded.bytes.is_empty() {
            return Err(GenerationError::malformed("downloaded video is empty"));
        }
        tracing::info!(polls, bytes = downloaded.bytes.len(), "video generation finished");

        Ok(GeneratedMedia::Bytes {
            mime_type: downloaded
                .mime_type
                .filter(|mime| mime.starts_with("video/"))
                .unwrap_or_else(|| DEFAULT_VIDEO_MIME.to_string()),
            bytes: downloaded.bytes,
        })
    }

    async fn describe_image(&self, source: &Artifact) -> Result<String, GenerationError> {
        self.transport()?;
        let source = image_source(source, "source")?;
        self.request_text(protocols::DESCRIBE, vec![inline_part(source)])
            .await
    }

    async fn extract_style(&self, source: &Artifact) -> Result<String, GenerationError> {
        self.transport()?;
        let source = image_source(source, "source")?;
        self.request_text(protocols::EXTRACT_STYLE, vec![inline_part(source)])
            .await
    }

    async fn refine_prompt(&self, text: &str) -> Result<String, GenerationError> {
        self.transport()?;
        if text.trim().is_empty() {
            return Err(GenerationError::unsupported("prompt is empty"));
        }
        self.request_text(protocols::REFINE, vec![Part::text(text)])
            .await
    }

    async fn preview_fast(&self, instruction: &str) -> Option<GeneratedMedia> {
        let transport = self.transport.as_ref()?;
        if instruction.trim().is_empty() {
            return None;
        }

        let model = self.config.preview_model.as_str();
        let request =
            GenerateContentRequest::user_turn(vec![Part::text(instruction)], Some(protocols::PREVIEW))
                .with_generation_config(GenerationConfig::image(None, None));
        let request = &request;

        let result = with_retry(self.config.preview_retry, move || {
            transport.generate_content(model, request)
        })
        .await
        .and_then(|response| classify::media_from_response(&response));

        match result {
            Ok(media) => Some(media),
            Err(error) => {
                tracing::debug!(kind = %error.kind(), "preview skipped");
                None
            }
        }
    }
}

/// Retries `operation` on transient classified failures.
async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeminiApiError>>,
{
    retry_with_backoff(policy, GenerationError::is_transient, |_attempt| {
        let call = operation();
        async move { call.await.map_err(|error| classify::transport_error(&error)) }
    })
    .await
}

fn image_source<'a>(artifact: &'a Artifact, role: &str) -> Result<&'a LocalBinary, GenerationError> {
    let Some(binary) = artifact.as_local() else {
        return Err(GenerationError::unsupported(format!(
            "the {role} is a remote reference; download or re-upload it first"
        )));
    };
    if binary.is_video() {
        return Err(GenerationError::unsupported(format!(
            "the {role} is a video; pick an image"
        )));
    }
    Ok(binary)
}

fn inline_part(binary: &LocalBinary) -> Part {
    Part::inline(binary.mime_type(), BASE64_STANDARD.encode(binary.bytes()))
}

fn validate_video_params(params: &VideoParams) -> Result<(), GenerationError> {
    if params.duration_secs == Some(0) {
        return Err(GenerationError::unsupported("video duration must be positive"));
    }
    if params.frame_rate == Some(0) {
        return Err(GenerationError::unsupported("frame rate must be positive"));
    }
    if let Some(motion) = params.motion_strength {
        if !(0.0..=1.0).contains(&motion) {
            return Err(GenerationError::unsupported(format!(
                "motion strength must be between 0 and 1, got {motion}"
            )));
        }
    }
    Ok(())
}

/// The video endpoint takes no system instruction, so the protocol and the
/// motion hints ride in the prompt.
fn video_prompt(instruction: &str, params: &VideoParams) -> String {
    let mut prompt = format!("{}\n\n{}", protocols::VIDEO, instruction.trim());

    if let Some(motion) = params.motion_strength {
        let label = if motion < 0.34 {
            "subtle"
        } else if motion < 0.67 {
            "moderate"
        } else {
            "dynamic"
        };
        prompt.push_str(&format!("\nCamera and subject motion: {label}."));
    }

    if let Some(frame_rate) = params.frame_rate {
        prompt.push_str(&format!("\nTarget frame rate: {frame_rate} fps."));
    }

    prompt
}

fn map_init_error(error: GeminiApiError) -> GatewayInitError {
    GatewayInitError::new(format!("Failed to initialize gemini gateway: {error}"))
}
