//! Session history and request orchestration for an iterative generative
//! image/video editor.
//!
//! # Public API Overview
//! - [`Timeline`]: linear undo/redo history of [`Artifact`]s.
//! - [`Session`]: timeline, active mode, settings and request status, shared as
//!   [`SharedSession`].
//! - [`Orchestrator`]: validates a [`GenerationRequest`], calls the gateway once,
//!   and applies exactly one timeline mutation.
//! - [`PreviewSlot`]: scoped display handles for the active artifact.

pub mod materialize;
pub mod orchestrator;
pub mod preview;
pub mod request;
pub mod session;
pub mod settings;
pub mod timeline;

pub use media_provider::{Artifact, ArtifactPayload, AspectRatio, EditingMode, LocalBinary};

pub use crate::orchestrator::{
    plan_generation, Applied, Capability, Mutation, Orchestrator, OrchestratorError, Plan,
};
pub use crate::preview::{PreviewHandle, PreviewSlot};
pub use crate::request::{GenerationParams, GenerationRequest};
pub use crate::session::{lock_session, Session, SessionSnapshot, SessionStatus, SharedSession};
pub use crate::settings::{SessionSettings, SettingsError};
pub use crate::timeline::{Timeline, TimelineKind};
