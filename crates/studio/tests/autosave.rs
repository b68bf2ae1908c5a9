use std::sync::Arc;
use std::time::Duration;

use artifact_store::ArtifactStore;
use media_provider::{Artifact, EditingMode, LocalBinary};
use retouch::{lock_session, Session, SessionSettings};
use studio::autosave::{Autosave, DEFAULT_DEBOUNCE};
use tempfile::TempDir;

fn png(name: &str) -> Artifact {
    Artifact::local(LocalBinary::new(vec![1_u8, 2, 3], "image/png", name, 0))
}

#[tokio::test(start_paused = true)]
async fn bursts_collapse_into_one_write_and_shutdown_flushes() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::open(dir.path().join("s.sqlite3")).expect("store"));
    let session = Session::new(SessionSettings::default()).into_shared();
    let autosave = Autosave::spawn(Arc::clone(&store), Arc::clone(&session), DEFAULT_DEBOUNCE);

    for name in ["a.png", "b.png", "c.png"] {
        let revision = {
            let mut guard = lock_session(&session);
            guard.upload(png(name));
            guard.revision()
        };
        autosave.notify(revision);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_secs(2)).await;

    let revision = {
        let mut guard = lock_session(&session);
        guard.set_active_mode(EditingMode::Vector);
        guard.revision()
    };
    autosave.notify(revision);

    let saves = autosave.shutdown().await;
    assert_eq!(saves, 2);

    let restored = store.load().expect("saved session");
    assert_eq!(restored.active_mode, EditingMode::Vector);
    let active = restored.timeline.active().and_then(Artifact::as_local).expect("local");
    assert_eq!(active.filename(), "c.png");
}

#[tokio::test(start_paused = true)]
async fn unchanged_sessions_are_not_rewritten() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::open(dir.path().join("s.sqlite3")).expect("store"));
    let session = Session::new(SessionSettings::default()).into_shared();
    let autosave = Autosave::spawn(Arc::clone(&store), Arc::clone(&session), DEFAULT_DEBOUNCE);

    let revision = lock_session(&session).revision();
    autosave.notify(revision);
    autosave.notify(revision);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(autosave.shutdown().await, 0);
    assert!(store.load().is_none());
}

#[tokio::test(start_paused = true)]
async fn forget_clears_the_stored_record_without_rewriting_it() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::open(dir.path().join("s.sqlite3")).expect("store"));
    let session = Session::new(SessionSettings::default()).into_shared();
    let autosave = Autosave::spawn(Arc::clone(&store), Arc::clone(&session), DEFAULT_DEBOUNCE);

    let revision = {
        let mut guard = lock_session(&session);
        guard.upload(png("a.png"));
        guard.revision()
    };
    autosave.notify(revision);
    tokio::time::sleep(Duration::from_secs(2)).await;

    let revision = {
        let mut guard = lock_session(&session);
        guard.reset();
        guard.revision()
    };
    autosave.forget(revision);

    assert_eq!(autosave.shutdown().await, 1);
    assert!(store.try_load().expect("load").is_none());
}
