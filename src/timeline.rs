//! Linear undo/redo history of artifacts.
//!
//! Invariant: `cursor` is `Some(i)` with `i < history.len()` exactly when the
//! history is non-empty. Every operation here is total and keeps it.

use media_provider::Artifact;
use serde::{Deserialize, Serialize};

/// What the cursor pages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    /// Chronological edits; index 0 is the original.
    #[default]
    Linear,
    /// Sibling variants of one batch generation.
    BatchSet,
}

impl TimelineKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::BatchSet => "batch_set",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    history: Vec<Artifact>,
    cursor: Option<usize>,
    kind: TimelineKind,
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a timeline from persisted parts. An out-of-range cursor is
    /// clamped to the last element; an empty history always has no cursor.
    #[must_use]
    pub fn restore(history: Vec<Artifact>, cursor: Option<usize>, kind: TimelineKind) -> Self {
        let cursor = match history.len() {
            0 => None,
            len => Some(cursor.unwrap_or(0).min(len - 1)),
        };
        let kind = if cursor.is_some() {
            kind
        } else {
            TimelineKind::Linear
        };
        Self {
            history,
            cursor,
            kind,
        }
    }

    pub fn set_from_upload(&mut self, artifact: Artifact) {
        self.replace_all(artifact);
    }

    /// Drops everything after the cursor, then appends.
    pub fn append_edit(&mut self, artifact: Artifact) {
        if let Some(cursor) = self.cursor {
            self.history.truncate(cursor + 1);
        }
        self.history.push(artifact);
        self.cursor = Some(self.history.len() - 1);
        self.kind = TimelineKind::Linear;
    }

    pub fn replace_all(&mut self, artifact: Artifact) {
        self.history = vec![artifact];
        self.cursor = Some(0);
        self.kind = TimelineKind::Linear;
    }

    /// Replaces the history with batch siblings and parks the cursor on the
    /// first. An empty batch resets the timeline.
    pub fn replace_all_batch(&mut self, artifacts: Vec<Artifact>) {
        if artifacts.is_empty() {
            self.reset();
            return;
        }
        self.history = artifacts;
        self.cursor = Some(0);
        self.kind = TimelineKind::BatchSet;
    }

    /// Returns whether the cursor moved.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                true
            }
            _ => false,
        }
    }

    /// Returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.history.len() => {
                self.cursor = Some(cursor + 1);
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.cursor = None;
        self.kind = TimelineKind::Linear;
    }

    #[must_use]
    pub fn active(&self) -> Option<&Artifact> {
        self.cursor.and_then(|cursor| self.history.get(cursor))
    }

    #[must_use]
    pub fn original(&self) -> Option<&Artifact> {
        self.history.first()
    }

    #[must_use]
    pub fn history(&self) -> &[Artifact] {
        &self.history
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn kind(&self) -> TimelineKind {
        self.kind
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.history.len())
    }

    /// One-based position for display, e.g. `step 2/4` or `variant 2/4`.
    #[must_use]
    pub fn position_label(&self) -> Option<String> {
        let cursor = self.cursor?;
        let noun = match self.kind {
            TimelineKind::Linear => "step",
            TimelineKind::BatchSet => "variant",
        };
        Some(format!("{noun} {}/{}", cursor + 1, self.history.len()))
    }
}

#[cfg(test)]
mod tests {
    use media_provider::LocalBinary;

    use super::*;

    fn artifact(name: &str) -> Artifact {
        Artifact::local(LocalBinary::new(name.as_bytes().to_vec(), "image/png", name, 0))
    }

    fn labels(timeline: &Timeline) -> Vec<&str> {
        timeline.history().iter().map(Artifact::label).collect()
    }

    #[test]
    fn empty_timeline_has_no_cursor_and_ignores_navigation() {
        let mut timeline = Timeline::new();

        assert!(!timeline.undo());
        assert!(!timeline.redo());
        assert_eq!(timeline.cursor(), None);
        assert!(timeline.active().is_none());
        assert_eq!(timeline.position_label(), None);
    }

    #[test]
    fn append_after_undo_discards_the_undone_branch() {
        let mut timeline = Timeline::new();
        timeline.set_from_upload(artifact("a"));
        timeline.append_edit(artifact("b"));
        timeline.append_edit(artifact("c"));

        assert!(timeline.undo());
        timeline.append_edit(artifact("d"));

        assert_eq!(labels(&timeline), vec!["a", "b", "d"]);
        assert_eq!(timeline.cursor(), Some(2));
        assert!(!timeline.can_redo());
    }

    #[test]
    fn batch_pages_through_variants_and_stops_at_the_end() {
        let mut timeline = Timeline::new();
        timeline.replace_all_batch(vec![
            artifact("v1"),
            artifact("v2"),
            artifact("v3"),
            artifact("v4"),
        ]);

        assert_eq!(timeline.kind(), TimelineKind::BatchSet);
        assert_eq!(timeline.cursor(), Some(0));
        assert!(timeline.redo() && timeline.redo() && timeline.redo());
        assert_eq!(timeline.cursor(), Some(3));
        assert!(!timeline.redo());
        assert_eq!(timeline.position_label().as_deref(), Some("variant 4/4"));
    }

    #[test]
    fn append_on_a_batch_returns_to_linear_history() {
        let mut timeline = Timeline::new();
        timeline.replace_all_batch(vec![artifact("v1"), artifact("v2"), artifact("v3")]);
        timeline.redo();

        timeline.append_edit(artifact("edited"));

        assert_eq!(labels(&timeline), vec!["v1", "v2", "edited"]);
        assert_eq!(timeline.kind(), TimelineKind::Linear);
    }

    #[test]
    fn empty_batch_resets() {
        let mut timeline = Timeline::new();
        timeline.set_from_upload(artifact("a"));

        timeline.replace_all_batch(Vec::new());

        assert!(timeline.is_empty());
        assert_eq!(timeline.cursor(), None);
    }

    #[test]
    fn restore_clamps_the_cursor_into_range() {
        let timeline = Timeline::restore(
            vec![artifact("a"), artifact("b")],
            Some(7),
            TimelineKind::Linear,
        );
        assert_eq!(timeline.cursor(), Some(1));

        let empty = Timeline::restore(Vec::new(), Some(3), TimelineKind::BatchSet);
        assert_eq!(empty.cursor(), None);
        assert_eq!(empty.kind(), TimelineKind::Linear);
    }
}
