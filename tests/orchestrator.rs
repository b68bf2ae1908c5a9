use std::sync::Arc;
use std::time::Duration;

use media_provider::{FailureKind, MediaGateway};
use media_provider_mock::MockGateway;
use pretty_assertions::assert_eq;
use retouch::{
    lock_session, Artifact, AspectRatio, Capability, EditingMode, GenerationParams,
    GenerationRequest, LocalBinary, Mutation, Orchestrator, OrchestratorError, Session,
    SessionStatus, SharedSession, TimelineKind,
};

fn upload(session: &SharedSession, name: &str) -> Artifact {
    let artifact = Artifact::local(LocalBinary::new(
        name.as_bytes().to_vec(),
        "image/png",
        name,
        1,
    ));
    lock_session(session).upload(artifact.clone());
    artifact
}

fn harness(gateway: MockGateway) -> (Arc<MockGateway>, Orchestrator, SharedSession) {
    let gateway = Arc::new(gateway);
    let orchestrator = Orchestrator::new(Arc::clone(&gateway) as Arc<dyn MediaGateway>);
    (gateway, orchestrator, Session::default().into_shared())
}

fn history_labels(session: &SharedSession) -> Vec<String> {
    lock_session(session)
        .timeline()
        .history()
        .iter()
        .map(|artifact| artifact.label().to_string())
        .collect()
}

#[tokio::test]
async fn upload_edit_undo_then_force_new_leaves_only_the_new_image() {
    let (_gateway, orchestrator, session) = harness(MockGateway::new());
    upload(&session, "img1.png");

    let edit = orchestrator
        .submit(&session, GenerationRequest::new(EditingMode::Adjust, "Golden Hour"))
        .await
        .expect("edit");
    assert_eq!(edit.mutation, Mutation::AppendEdit);
    assert_eq!(lock_session(&session).timeline().len(), 2);

    assert!(lock_session(&session).undo());
    let generated = orchestrator
        .submit(
            &session,
            GenerationRequest::new(EditingMode::Generate, "a lighthouse").forcing_new(),
        )
        .await
        .expect("generate");

    assert_eq!(generated.capability, Capability::GenerateImage);
    let labels = history_labels(&session);
    assert_eq!(labels.len(), 1);
    assert!(labels[0].starts_with("gen-") && labels[0].ends_with(".png"));
    assert_eq!(lock_session(&session).timeline().cursor(), Some(0));
}

#[tokio::test]
async fn batch_of_four_is_browsed_with_redo() {
    let (gateway, orchestrator, session) = harness(MockGateway::new());

    orchestrator
        .submit(
            &session,
            GenerationRequest::new(EditingMode::Generate, "owl portraits").with_batch_count(4),
        )
        .await
        .expect("batch");

    let mut guard = lock_session(&session);
    assert_eq!(guard.timeline().len(), 4);
    assert_eq!(guard.timeline().cursor(), Some(0));
    assert_eq!(guard.timeline().kind(), TimelineKind::BatchSet);
    assert!(guard.redo() && guard.redo() && guard.redo());
    assert_eq!(guard.timeline().cursor(), Some(3));
    assert!(!guard.redo());
    assert_eq!(gateway.call_count(), 4);
    assert!(guard.timeline().history()[3].label().ends_with("-4.png"));
}

#[tokio::test]
async fn batch_skips_a_remote_video_as_its_guide() {
    let (gateway, orchestrator, session) =
        harness(MockGateway::new().with_remote_video("https://files.local/clip.mp4"));
    upload(&session, "still.png");
    orchestrator
        .submit(&session, GenerationRequest::new(EditingMode::Video, "slow zoom"))
        .await
        .expect("video");
    assert!(lock_session(&session).timeline().active().expect("active").is_reference());

    let applied = orchestrator
        .submit(
            &session,
            GenerationRequest::new(EditingMode::Style, "watercolor").with_batch_count(2),
        )
        .await
        .expect("batch without a usable guide");

    assert_eq!(applied.mutation, Mutation::ReplaceAllBatch);
    let guard = lock_session(&session);
    assert_eq!(guard.timeline().kind(), TimelineKind::BatchSet);
    assert_eq!(guard.timeline().len(), 2);
    assert_eq!(gateway.call_count(), 3);
}

#[tokio::test]
async fn rate_limited_twice_then_success_applies_one_mutation() {
    let (gateway, orchestrator, session) = harness(MockGateway::new());
    upload(&session, "img1.png");
    gateway.fail_next_times(FailureKind::RateLimited, 2);

    orchestrator
        .submit(&session, GenerationRequest::new(EditingMode::Edit, "sharpen"))
        .await
        .expect("retried edit");

    let guard = lock_session(&session);
    assert_eq!(guard.timeline().len(), 2);
    assert_eq!(guard.status(), &SessionStatus::Idle);
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(gateway.attempts(), 3);
}

#[tokio::test]
async fn gateway_failure_leaves_the_timeline_untouched() {
    let (gateway, orchestrator, session) = harness(MockGateway::new());
    upload(&session, "img1.png");
    let before = lock_session(&session).snapshot();
    gateway.fail_next(FailureKind::SafetyRejected);

    let error = orchestrator
        .submit(&session, GenerationRequest::new(EditingMode::Edit, "something"))
        .await
        .expect_err("blocked");

    assert_eq!(error.kind(), Some(FailureKind::SafetyRejected));
    let guard = lock_session(&session);
    assert_eq!(guard.snapshot(), before);
    assert_eq!(guard.status(), &SessionStatus::Failed(error.user_message()));
    assert!(!guard.status().is_loading());
}

#[tokio::test]
async fn invalid_request_fails_without_calling_the_gateway() {
    let (gateway, orchestrator, session) = harness(MockGateway::new());

    let error = orchestrator
        .submit(
            &session,
            GenerationRequest::new(EditingMode::Video, "pan").with_params(GenerationParams {
                aspect_ratio: Some(AspectRatio::Ultrawide),
                ..GenerationParams::default()
            }),
        )
        .await
        .expect_err("21:9 video");

    assert_eq!(error.kind(), Some(FailureKind::UnsupportedInput));
    assert_eq!(gateway.call_count(), 0);
    assert!(lock_session(&session).status().error().is_some());
}

#[tokio::test(start_paused = true)]
async fn second_submit_is_rejected_while_the_first_is_in_flight() {
    let (gateway, orchestrator, session) =
        harness(MockGateway::new().with_latency(Duration::from_secs(2)));
    let orchestrator = Arc::new(orchestrator);
    upload(&session, "img1.png");

    let first = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        let session = Arc::clone(&session);
        async move {
            orchestrator
                .submit(&session, GenerationRequest::new(EditingMode::Edit, "first"))
                .await
        }
    });
    tokio::task::yield_now().await;
    assert!(lock_session(&session).status().is_loading());

    let second = orchestrator
        .submit(&session, GenerationRequest::new(EditingMode::Edit, "second"))
        .await;
    assert_eq!(second, Err(OrchestratorError::Busy));

    first
        .await
        .expect("task joins")
        .expect("first submit succeeds");
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(lock_session(&session).timeline().len(), 2);
}

#[tokio::test]
async fn video_from_a_source_appends_and_remote_results_stay_references() {
    let (_gateway, orchestrator, session) =
        harness(MockGateway::new().with_remote_video("https://files.local/clip.mp4"));
    upload(&session, "still.png");

    let applied = orchestrator
        .submit(&session, GenerationRequest::new(EditingMode::Video, "slow zoom"))
        .await
        .expect("video");

    assert_eq!(applied.mutation, Mutation::AppendEdit);
    let guard = lock_session(&session);
    let active = guard.timeline().active().expect("active");
    assert!(active.is_reference());
    assert_eq!(active.label(), "https://files.local/clip.mp4");
}

#[tokio::test]
async fn masked_inpaint_uses_the_mask_capability() {
    let (gateway, orchestrator, session) = harness(MockGateway::new());
    upload(&session, "room.png");
    let mask = LocalBinary::new(vec![255_u8; 4], "image/png", "mask.png", 0);

    orchestrator
        .submit(
            &session,
            GenerationRequest::new(EditingMode::Inpaint, "remove the lamp").with_mask(mask),
        )
        .await
        .expect("inpaint");

    let capabilities: Vec<_> = gateway.calls().iter().map(|call| call.capability).collect();
    assert_eq!(capabilities, vec!["edit_with_mask"]);
}

#[tokio::test]
async fn helpers_never_mutate_the_timeline() {
    let (_gateway, orchestrator, session) = harness(MockGateway::new());

    let error = orchestrator.describe(&session).await.expect_err("nothing to describe");
    assert_eq!(error.kind(), Some(FailureKind::UnsupportedInput));

    upload(&session, "cat.png");
    let before = lock_session(&session).snapshot();

    let description = orchestrator.describe(&session).await.expect("describe");
    assert!(description.contains("cat.png"));
    orchestrator.extract_style(&session).await.expect("style");
    orchestrator.refine_prompt("a cat").await.expect("refine");
    let preview = orchestrator.preview("a cat").await.expect("preview");
    assert!(!preview.is_reference());

    assert_eq!(lock_session(&session).snapshot(), before);
}
