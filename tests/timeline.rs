use pretty_assertions::assert_eq;
use retouch::{Artifact, LocalBinary, Timeline, TimelineKind};

fn artifact(name: &str) -> Artifact {
    Artifact::local(LocalBinary::new(name.as_bytes().to_vec(), "image/png", name, 0))
}

fn labels(timeline: &Timeline) -> Vec<String> {
    timeline
        .history()
        .iter()
        .map(|artifact| artifact.label().to_string())
        .collect()
}

#[test]
fn every_append_grows_history_by_one_and_parks_the_cursor_at_the_end() {
    let mut timeline = Timeline::new();
    timeline.set_from_upload(artifact("original"));

    for calls in 1..=6 {
        timeline.append_edit(artifact(&format!("edit-{calls}")));

        assert_eq!(timeline.len(), calls + 1);
        assert_eq!(timeline.cursor(), Some(timeline.len() - 1));
        assert_eq!(timeline.original().map(Artifact::label), Some("original"));
    }
}

#[test]
fn undo_then_redo_restores_the_cursor_and_boundaries_are_no_ops() {
    let mut timeline = Timeline::new();
    timeline.set_from_upload(artifact("a"));
    timeline.append_edit(artifact("b"));
    timeline.append_edit(artifact("c"));

    for _ in 0..2 {
        let before = timeline.cursor();
        assert!(timeline.undo());
        assert!(timeline.redo());
        assert_eq!(timeline.cursor(), before);
        timeline.undo();
    }

    assert_eq!(timeline.cursor(), Some(0));
    assert!(!timeline.undo());
    assert_eq!(timeline.cursor(), Some(0));

    assert!(timeline.redo() && timeline.redo());
    assert!(!timeline.redo());
    assert_eq!(timeline.cursor(), Some(2));
}

#[test]
fn undo_then_append_truncates_the_redo_branch() {
    let mut timeline = Timeline::new();
    timeline.set_from_upload(artifact("A"));
    timeline.append_edit(artifact("B"));
    timeline.append_edit(artifact("C"));

    timeline.undo();
    timeline.append_edit(artifact("D"));

    assert_eq!(labels(&timeline), vec!["A", "B", "D"]);
    assert_eq!(timeline.cursor(), Some(2));
}

#[test]
fn upload_and_reset_start_over() {
    let mut timeline = Timeline::new();
    timeline.replace_all_batch(vec![artifact("v1"), artifact("v2")]);

    timeline.set_from_upload(artifact("photo"));
    assert_eq!(labels(&timeline), vec!["photo"]);
    assert_eq!(timeline.kind(), TimelineKind::Linear);

    timeline.reset();
    assert!(timeline.is_empty());
    assert_eq!(timeline.cursor(), None);
    assert!(!timeline.can_undo() && !timeline.can_redo());
}
