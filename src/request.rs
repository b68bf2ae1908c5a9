use media_provider::{Artifact, AspectRatio, EditingMode, LocalBinary, VideoParams};

/// Optional knobs forwarded to the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    pub aspect_ratio: Option<AspectRatio>,
    pub duration_secs: Option<u32>,
    pub frame_rate: Option<u32>,
    pub motion_strength: Option<f32>,
    pub seed: Option<u64>,
}

impl GenerationParams {
    pub(crate) fn video(&self) -> VideoParams {
        VideoParams {
            duration_secs: self.duration_secs,
            frame_rate: self.frame_rate,
            motion_strength: self.motion_strength,
            seed: self.seed,
        }
    }
}

/// One user action bound for the gateway. Consumed by a single submit.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub mode: EditingMode,
    pub instruction: String,
    /// Extra guide image sent alongside the source.
    pub reference: Option<Artifact>,
    pub mask: Option<LocalBinary>,
    pub batch_count: Option<usize>,
    /// Edit the first history entry instead of the active one.
    pub use_original: bool,
    /// Ignore the timeline and generate from scratch.
    pub force_new: bool,
    pub params: GenerationParams,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(mode: EditingMode, instruction: impl Into<String>) -> Self {
        Self {
            mode,
            instruction: instruction.into(),
            reference: None,
            mask: None,
            batch_count: None,
            use_original: false,
            force_new: false,
            params: GenerationParams::default(),
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: Artifact) -> Self {
        self.reference = Some(reference);
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: LocalBinary) -> Self {
        self.mask = Some(mask);
        self
    }

    #[must_use]
    pub fn with_batch_count(mut self, count: usize) -> Self {
        self.batch_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn from_original(mut self) -> Self {
        self.use_original = true;
        self
    }

    #[must_use]
    pub fn forcing_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}
