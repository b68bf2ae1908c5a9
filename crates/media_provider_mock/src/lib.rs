//! Deterministic mock implementation of the `media_provider` contract.
//!
//! No transport logic lives here. Failures are scripted per call, which makes
//! the gateway usable for orchestrator tests and offline runs of the shell.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use media_provider::{
    Artifact, EditImageInput, FailureKind, GatewayProfile, GenerateImageInput,
    GenerateVideoInput, GeneratedMedia, GenerationError, MaskedEditInput, MediaGateway,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// A 1x1 transparent PNG.
pub const MOCK_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Leading bytes of an ISO-BMFF (`ftyp`) box; enough for a mime sniff.
pub const MOCK_MP4_BYTES: &[u8] = &[0, 0, 0, 24, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];

const DEFAULT_MAX_RETRIES: u32 = 3;

/// One recorded capability invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub capability: &'static str,
    pub instruction: String,
}

/// Deterministic gateway used by tests and `RETOUCH_PROVIDER=mock` runs.
#[derive(Debug)]
pub struct MockGateway {
    failures: Mutex<VecDeque<FailureKind>>,
    log: Mutex<Vec<MockCall>>,
    attempts: AtomicUsize,
    max_retries: u32,
    latency: Duration,
    remote_video: Option<String>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            max_retries: DEFAULT_MAX_RETRIES,
            latency: Duration::ZERO,
            remote_video: None,
        }
    }

    /// Transient scripted failures are absorbed up to this many times per call.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Simulated provider latency per attempt.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Video results become remote references to `url` instead of bytes.
    #[must_use]
    pub fn with_remote_video(mut self, url: impl Into<String>) -> Self {
        self.remote_video = Some(url.into());
        self
    }

    /// Queues one failure. Each attempt consumes at most one queued failure.
    pub fn fail_next(&self, kind: FailureKind) {
        lock_unpoisoned(&self.failures).push_back(kind);
    }

    pub fn fail_next_times(&self, kind: FailureKind, times: usize) {
        let mut failures = lock_unpoisoned(&self.failures);
        failures.extend(std::iter::repeat(kind).take(times));
    }

    /// Logical capability calls, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock_unpoisoned(&self.log).clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock_unpoisoned(&self.log).len()
    }

    /// Attempts including simulated retries.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn attempt(
        &self,
        capability: &'static str,
        instruction: &str,
    ) -> Result<(), GenerationError> {
        lock_unpoisoned(&self.log).push(MockCall {
            capability,
            instruction: instruction.to_string(),
        });

        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let scripted = lock_unpoisoned(&self.failures).pop_front();
            match scripted {
                None => return Ok(()),
                Some(kind) if kind.is_transient() && attempt < max_attempts => {
                    tracing::debug!(capability, attempt, %kind, "mock transient failure, retrying");
                }
                Some(kind) => {
                    return Err(GenerationError::new(
                        kind,
                        format!("scripted {kind} failure in {capability}"),
                    ))
                }
            }
        }
    }

    fn image() -> GeneratedMedia {
        GeneratedMedia::Encoded {
            mime_type: "image/png".to_string(),
            data: MOCK_PNG_BASE64.to_string(),
        }
    }
}

#[async_trait]
impl MediaGateway for MockGateway {
    fn profile(&self) -> GatewayProfile {
        GatewayProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            image_model: "mock-image".to_string(),
            video_model: "mock-video".to_string(),
            authenticated: true,
        }
    }

    async fn edit_image(&self, input: EditImageInput) -> Result<GeneratedMedia, GenerationError> {
        if input.source.is_reference() {
            return Err(GenerationError::unsupported(
                "the source is a remote reference; download or re-upload it first",
            ));
        }
        self.attempt("edit_image", &input.instruction).await?;
        Ok(Self::image())
    }

    async fn generate_image(
        &self,
        input: GenerateImageInput,
    ) -> Result<GeneratedMedia, GenerationError> {
        if let Some(reference) = &input.reference {
            if reference.as_local().map_or(true, |binary| binary.is_video()) {
                return Err(GenerationError::unsupported(
                    "the reference must be a local image",
                ));
            }
        }
        self.attempt("generate_image", &input.instruction).await?;
        Ok(Self::image())
    }

    async fn edit_with_mask(
        &self,
        input: MaskedEditInput,
    ) -> Result<GeneratedMedia, GenerationError> {
        self.attempt("edit_with_mask", &input.instruction).await?;
        Ok(Self::image())
    }

    async fn generate_video(
        &self,
        input: GenerateVideoInput,
    ) -> Result<GeneratedMedia, GenerationError> {
        if let Some(ratio) = input.aspect_ratio.filter(|ratio| !ratio.supports_video()) {
            return Err(GenerationError::unsupported(format!(
                "aspect ratio {ratio} is not available for video, use 16:9 or 9:16"
            )));
        }
        self.attempt("generate_video", &input.instruction).await?;

        Ok(match &self.remote_video {
            Some(url) => GeneratedMedia::Remote { url: url.clone() },
            None => GeneratedMedia::Bytes {
                mime_type: "video/mp4".to_string(),
                bytes: MOCK_MP4_BYTES.to_vec(),
            },
        })
    }

    async fn describe_image(&self, source: &Artifact) -> Result<String, GenerationError> {
        self.attempt("describe_image", "").await?;
        Ok(format!("A mock description of {}.", source.label()))
    }

    async fn extract_style(&self, _source: &Artifact) -> Result<String, GenerationError> {
        self.attempt("extract_style", "").await?;
        Ok("flat colors, soft window light, film grain".to_string())
    }

    async fn refine_prompt(&self, text: &str) -> Result<String, GenerationError> {
        self.attempt("refine_prompt", text).await?;
        Ok(format!("{}, highly detailed, natural lighting", text.trim()))
    }

    async fn preview_fast(&self, instruction: &str) -> Option<GeneratedMedia> {
        match self.attempt("preview_fast", instruction).await {
            Ok(()) => Some(Self::image()),
            Err(error) => {
                tracing::debug!(%error, "mock preview skipped");
                None
            }
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use media_provider::{AspectRatio, EditingMode, LocalBinary, VideoParams};

    use super::*;

    fn generate(instruction: &str) -> GenerateImageInput {
        GenerateImageInput {
            mode: EditingMode::Generate,
            instruction: instruction.to_string(),
            aspect_ratio: None,
            reference: None,
            seed: None,
            pro: false,
        }
    }

    #[tokio::test]
    async fn transient_failures_are_absorbed_within_the_retry_budget() {
        let gateway = MockGateway::new();
        gateway.fail_next_times(FailureKind::RateLimited, 2);

        gateway
            .generate_image(generate("lighthouse"))
            .await
            .expect("third attempt succeeds");

        assert_eq!(gateway.call_count(), 1);
        assert_eq!(gateway.attempts(), 3);
    }

    #[tokio::test]
    async fn exhausted_retry_budget_surfaces_the_last_failure() {
        let gateway = MockGateway::new().with_max_retries(1);
        gateway.fail_next_times(FailureKind::ServiceUnavailable, 5);

        let error = gateway
            .generate_image(generate("lighthouse"))
            .await
            .expect_err("budget exhausted");

        assert_eq!(error.kind(), FailureKind::ServiceUnavailable);
        assert_eq!(gateway.attempts(), 2);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let gateway = MockGateway::new();
        gateway.fail_next(FailureKind::SafetyRejected);

        let error = gateway
            .generate_image(generate("lighthouse"))
            .await
            .expect_err("blocked");

        assert_eq!(error.kind(), FailureKind::SafetyRejected);
        assert_eq!(gateway.attempts(), 1);
        assert!(gateway.preview_fast("lighthouse").await.is_some());
    }

    #[tokio::test]
    async fn references_must_be_local_images() {
        let gateway = MockGateway::new();
        let mut input = generate("lighthouse");
        input.reference = Some(Artifact::remote("https://files.local/clip.mp4"));

        let error = gateway
            .generate_image(input.clone())
            .await
            .expect_err("remote guide");
        assert_eq!(error.kind(), FailureKind::UnsupportedInput);
        assert_eq!(gateway.call_count(), 0);

        input.reference = Some(Artifact::local(LocalBinary::new(vec![1], "image/png", "g.png", 0)));
        gateway.generate_image(input).await.expect("local guide");
    }

    #[tokio::test]
    async fn video_returns_bytes_or_a_remote_reference() {
        let input = GenerateVideoInput {
            instruction: "waves".to_string(),
            aspect_ratio: Some(AspectRatio::Landscape16x9),
            source: None,
            params: VideoParams::default(),
        };

        let bytes = MockGateway::new()
            .generate_video(input.clone())
            .await
            .expect("video bytes");
        assert_eq!(bytes.mime_type(), Some("video/mp4"));

        let remote = MockGateway::new()
            .with_remote_video("https://files.local/clip.mp4")
            .generate_video(input)
            .await
            .expect("remote video");
        assert_eq!(
            remote,
            GeneratedMedia::Remote {
                url: "https://files.local/clip.mp4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn call_log_records_capabilities_in_order() {
        let gateway = MockGateway::new();
        let source = Artifact::local(LocalBinary::new(vec![1_u8], "image/png", "a.png", 0));

        gateway.refine_prompt("cat").await.expect("refine");
        gateway.describe_image(&source).await.expect("describe");

        let capabilities: Vec<_> = gateway.calls().iter().map(|call| call.capability).collect();
        assert_eq!(capabilities, vec!["refine_prompt", "describe_image"]);
    }
}
