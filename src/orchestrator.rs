//! Turns one user action into one gateway call and one timeline mutation.

use std::sync::Arc;

use media_provider::{
    Artifact, EditImageInput, EditingMode, FailureKind, GenerateImageInput, GenerateVideoInput,
    GenerationError, MaskedEditInput, MediaGateway, MAX_BATCH_COUNT,
};
use thiserror::Error;

use crate::materialize::{self, Origin};
use crate::request::GenerationRequest;
use crate::session::{lock_session, SharedSession};
use crate::timeline::Timeline;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("a generation is already in progress")]
    Busy,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl OrchestratorError {
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Busy => None,
            Self::Generation(error) => Some(error.kind()),
        }
    }

    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => "Please wait for the current generation to finish.".to_string(),
            Self::Generation(error) => error.user_message(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    EditImage,
    GenerateImage,
    GenerateBatch { count: usize },
    EditWithMask,
    GenerateVideo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    AppendEdit,
    ReplaceAll,
    ReplaceAllBatch,
}

/// What a request will do, decided before any I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub capability: Capability,
    pub mutation: Mutation,
    pub source: Option<Artifact>,
}

/// Result of an applied generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub capability: Capability,
    pub mutation: Mutation,
    pub added: usize,
}

/// Validates `request` against `timeline` and picks the capability and mutation.
pub fn plan_generation(
    timeline: &Timeline,
    request: &GenerationRequest,
) -> Result<Plan, GenerationError> {
    if request.instruction.trim().is_empty() {
        return Err(GenerationError::unsupported("instruction is empty"));
    }

    let batch_count = request.batch_count.unwrap_or(1);
    if batch_count == 0 || batch_count > MAX_BATCH_COUNT {
        return Err(GenerationError::unsupported(format!(
            "batch count must be between 1 and {MAX_BATCH_COUNT}, got {batch_count}"
        )));
    }

    let source = if request.force_new {
        None
    } else if request.use_original {
        timeline.original().cloned()
    } else {
        timeline.active().cloned()
    };

    if request.mode.is_video() {
        if let Some(ratio) = request.params.aspect_ratio {
            if !ratio.supports_video() {
                return Err(GenerationError::unsupported(format!(
                    "aspect ratio {ratio} is not available for video, use 16:9 or 9:16"
                )));
            }
        }
        if batch_count > 1 {
            return Err(GenerationError::unsupported("video cannot be generated in batches"));
        }
        let mutation = if source.is_some() {
            Mutation::AppendEdit
        } else {
            Mutation::ReplaceAll
        };
        return Ok(Plan {
            capability: Capability::GenerateVideo,
            mutation,
            source,
        });
    }

    let (capability, mutation) = if batch_count > 1 {
        (
            Capability::GenerateBatch { count: batch_count },
            Mutation::ReplaceAllBatch,
        )
    } else if source.is_none() {
        (Capability::GenerateImage, Mutation::ReplaceAll)
    } else if request.mode == EditingMode::Inpaint && request.mask.is_some() {
        (Capability::EditWithMask, Mutation::AppendEdit)
    } else {
        (Capability::EditImage, Mutation::AppendEdit)
    };

    Ok(Plan {
        capability,
        mutation,
        source,
    })
}

pub struct Orchestrator {
    gateway: Arc<dyn MediaGateway>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(gateway: Arc<dyn MediaGateway>) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn MediaGateway> {
        &self.gateway
    }

    /// Runs one generation end to end.
    ///
    /// Rejected with [`OrchestratorError::Busy`] while another submit is in
    /// flight. On failure the timeline is untouched and the session status
    /// carries the user-facing message.
    pub async fn submit(
        &self,
        session: &SharedSession,
        request: GenerationRequest,
    ) -> Result<Applied, OrchestratorError> {
        let (plan, pro) = {
            let mut guard = lock_session(session);
            if guard.status().is_loading() {
                tracing::debug!("submit rejected: generation in flight");
                return Err(OrchestratorError::Busy);
            }
            match plan_generation(guard.timeline(), &request) {
                Ok(plan) => {
                    guard.begin_loading();
                    (plan, guard.settings().pro_tier)
                }
                Err(error) => {
                    guard.fail(error.user_message());
                    return Err(error.into());
                }
            }
        };
        tracing::debug!(
            mode = %request.mode,
            capability = ?plan.capability,
            mutation = ?plan.mutation,
            has_source = plan.source.is_some(),
            "planned generation"
        );

        let outcome = self.execute(&plan, request, pro).await;

        let mut guard = lock_session(session);
        match outcome {
            Ok(artifacts) => {
                let added = artifacts.len();
                apply(guard.timeline_mut(), plan.mutation, artifacts);
                guard.finish();
                tracing::info!(
                    mutation = ?plan.mutation,
                    added,
                    len = guard.timeline().len(),
                    "generation applied"
                );
                Ok(Applied {
                    capability: plan.capability,
                    mutation: plan.mutation,
                    added,
                })
            }
            Err(error) => {
                tracing::warn!(kind = %error.kind(), detail = error.detail(), "generation failed");
                guard.fail(error.user_message());
                Err(error.into())
            }
        }
    }

    async fn execute(
        &self,
        plan: &Plan,
        request: GenerationRequest,
        pro: bool,
    ) -> Result<Vec<Artifact>, GenerationError> {
        let unix_ms = materialize::now_unix_ms();
        let aspect_ratio = request.params.aspect_ratio;

        match (plan.capability, plan.source.clone()) {
            (Capability::GenerateVideo, source) => {
                let origin = if source.is_some() {
                    Origin::Edit
                } else {
                    Origin::Generate
                };
                let media = self
                    .gateway
                    .generate_video(GenerateVideoInput {
                        instruction: request.instruction,
                        aspect_ratio,
                        params: request.params.video(),
                        source,
                    })
                    .await?;
                Ok(vec![materialize::materialize(media, origin, unix_ms, None)?])
            }
            (Capability::GenerateBatch { count }, source) => {
                let media = self
                    .gateway
                    .generate_batch(
                        GenerateImageInput {
                            mode: request.mode,
                            instruction: request.instruction,
                            aspect_ratio,
                            reference: request.reference.or_else(|| source.filter(is_image_guide)),
                            seed: request.params.seed,
                            pro,
                        },
                        count,
                    )
                    .await?;
                materialize::materialize_batch(media, unix_ms)
            }
            (Capability::GenerateImage, _) => {
                let media = self
                    .gateway
                    .generate_image(GenerateImageInput {
                        mode: request.mode,
                        instruction: request.instruction,
                        aspect_ratio,
                        reference: request.reference,
                        seed: request.params.seed,
                        pro,
                    })
                    .await?;
                Ok(vec![materialize::materialize(media, Origin::Generate, unix_ms, None)?])
            }
            (Capability::EditWithMask, Some(source)) => {
                let mask = request
                    .mask
                    .ok_or_else(|| GenerationError::unsupported("inpainting needs a mask"))?;
                let media = self
                    .gateway
                    .edit_with_mask(MaskedEditInput {
                        source,
                        mask,
                        instruction: request.instruction,
                        pro,
                    })
                    .await?;
                Ok(vec![materialize::materialize(media, Origin::Edit, unix_ms, None)?])
            }
            (Capability::EditImage, Some(source)) => {
                let media = self
                    .gateway
                    .edit_image(EditImageInput {
                        mode: request.mode,
                        source,
                        instruction: request.instruction,
                        aspect_ratio,
                        reference: request.reference,
                        pro,
                    })
                    .await?;
                Ok(vec![materialize::materialize(media, Origin::Edit, unix_ms, None)?])
            }
            (Capability::EditWithMask | Capability::EditImage, None) => {
                Err(GenerationError::unsupported("there is no image to edit"))
            }
        }
    }

    /// Describes the active artifact. Never touches the timeline.
    pub async fn describe(&self, session: &SharedSession) -> Result<String, OrchestratorError> {
        let active = active_artifact(session)?;
        Ok(self.gateway.describe_image(&active).await?)
    }

    pub async fn extract_style(&self, session: &SharedSession) -> Result<String, OrchestratorError> {
        let active = active_artifact(session)?;
        Ok(self.gateway.extract_style(&active).await?)
    }

    pub async fn refine_prompt(&self, text: &str) -> Result<String, OrchestratorError> {
        if text.trim().is_empty() {
            return Err(GenerationError::unsupported("prompt is empty").into());
        }
        Ok(self.gateway.refine_prompt(text).await?)
    }

    /// Advisory draft for `instruction`; `None` on any failure. Not gated by
    /// the loading status.
    pub async fn preview(&self, instruction: &str) -> Option<Artifact> {
        let media = self.gateway.preview_fast(instruction).await?;
        match materialize::materialize(media, Origin::Generate, materialize::now_unix_ms(), None) {
            Ok(artifact) => Some(artifact),
            Err(error) => {
                tracing::debug!(%error, "preview discarded");
                None
            }
        }
    }
}

/// Only local stills can steer a batch; videos and remote references are skipped.
fn is_image_guide(artifact: &Artifact) -> bool {
    artifact.as_local().is_some_and(|binary| !binary.is_video())
}

fn active_artifact(session: &SharedSession) -> Result<Artifact, OrchestratorError> {
    lock_session(session)
        .timeline()
        .active()
        .cloned()
        .ok_or_else(|| GenerationError::unsupported("there is no image yet").into())
}

fn apply(timeline: &mut Timeline, mutation: Mutation, mut artifacts: Vec<Artifact>) {
    match mutation {
        Mutation::ReplaceAllBatch => timeline.replace_all_batch(artifacts),
        Mutation::AppendEdit | Mutation::ReplaceAll => {
            let Some(artifact) = artifacts.pop() else {
                return;
            };
            if mutation == Mutation::AppendEdit {
                timeline.append_edit(artifact);
            } else {
                timeline.replace_all(artifact);
            }
        }
    }
}
