//! The one live editing session and its persisted snapshot.

use std::sync::{Arc, Mutex, MutexGuard};

use media_provider::{Artifact, EditingMode};

use crate::settings::SessionSettings;
use crate::timeline::Timeline;

/// Session shared between the shell and in-flight generations.
pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    /// The last request failed with this user-facing message.
    Failed(String),
}

impl SessionStatus {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// The durable part of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub timeline: Timeline,
    pub active_mode: EditingMode,
    pub settings: SessionSettings,
}

#[derive(Debug, Default)]
pub struct Session {
    timeline: Timeline,
    active_mode: EditingMode,
    settings: SessionSettings,
    status: SessionStatus,
    revision: u64,
}

impl Session {
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            timeline: snapshot.timeline,
            active_mode: snapshot.active_mode,
            settings: snapshot.settings.normalized(),
            status: SessionStatus::Idle,
            revision: 0,
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            timeline: self.timeline.clone(),
            active_mode: self.active_mode,
            settings: self.settings.clone(),
        }
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn active_mode(&self) -> EditingMode {
        self.active_mode
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Bumped by every change that should reach the store.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn upload(&mut self, artifact: Artifact) {
        self.timeline.set_from_upload(artifact);
        self.touch();
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.timeline.undo();
        if moved {
            self.touch();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.timeline.redo();
        if moved {
            self.touch();
        }
        moved
    }

    /// Empties the timeline. Settings survive.
    pub fn reset(&mut self) {
        self.timeline.reset();
        self.status = SessionStatus::Idle;
        self.touch();
    }

    pub fn set_active_mode(&mut self, mode: EditingMode) {
        if self.active_mode != mode {
            self.active_mode = mode;
            self.touch();
        }
    }

    pub fn update_settings<R>(&mut self, update: impl FnOnce(&mut SessionSettings) -> R) -> R {
        let result = update(&mut self.settings);
        self.touch();
        result
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.status, SessionStatus::Failed(_)) {
            self.status = SessionStatus::Idle;
        }
    }

    pub(crate) fn timeline_mut(&mut self) -> &mut Timeline {
        self.touch();
        &mut self.timeline
    }

    pub(crate) fn begin_loading(&mut self) {
        self.status = SessionStatus::Loading;
    }

    pub(crate) fn finish(&mut self) {
        self.status = SessionStatus::Idle;
    }

    /// Records a user-facing failure. The timeline is left alone.
    pub fn fail(&mut self, message: String) {
        self.status = SessionStatus::Failed(message);
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Locks the session, recovering the guard if a holder panicked.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, Session> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
