//! Debounced persistence of the shared session.
//!
//! Callers [`Autosave::notify`] after every action. Bursts of notifications
//! inside the debounce window collapse into one write; writes run on the
//! blocking pool and are skipped when the session revision has not moved.
//! [`Autosave::forget`] deletes the stored record on the next flush instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use artifact_store::ArtifactStore;
use retouch::{lock_session, SharedSession};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(750);

pub struct Autosave {
    tx: watch::Sender<u64>,
    task: JoinHandle<()>,
    saves: Arc<AtomicUsize>,
    forget: Arc<Mutex<Option<u64>>>,
}

impl Autosave {
    /// Must be called inside a tokio runtime. The session's current revision
    /// counts as already saved.
    pub fn spawn(store: Arc<ArtifactStore>, session: SharedSession, debounce: Duration) -> Self {
        let revision = lock_session(&session).revision();
        let (tx, rx) = watch::channel(revision);
        let saves = Arc::new(AtomicUsize::new(0));
        let forget = Arc::new(Mutex::new(None));
        let worker = Worker {
            store,
            session,
            saved_revision: revision,
            saves: Arc::clone(&saves),
            forget: Arc::clone(&forget),
        };
        let task = tokio::spawn(worker.run(rx, debounce));
        Self {
            tx,
            task,
            saves,
            forget,
        }
    }

    pub fn notify(&self, revision: u64) {
        self.tx.send_replace(revision);
    }

    /// Deletes the stored record on the next flush. The session at `revision`
    /// counts as persisted, so it is not written back.
    pub fn forget(&self, revision: u64) {
        *lock_forget(&self.forget) = Some(revision);
        self.tx.send_replace(revision);
    }

    /// Completed writes.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Flushes a pending change and waits for the worker to stop.
    pub async fn shutdown(self) -> usize {
        let Self {
            tx, task, saves, ..
        } = self;
        drop(tx);
        if let Err(error) = task.await {
            tracing::warn!(%error, "autosave worker ended abnormally");
        }
        saves.load(Ordering::SeqCst)
    }
}

struct Worker {
    store: Arc<ArtifactStore>,
    session: SharedSession,
    saved_revision: u64,
    saves: Arc<AtomicUsize>,
    forget: Arc<Mutex<Option<u64>>>,
}

impl Worker {
    async fn run(mut self, mut rx: watch::Receiver<u64>, debounce: Duration) {
        while rx.changed().await.is_ok() {
            // Quiet period: restart the window on every new notification.
            loop {
                match tokio::time::timeout(debounce, rx.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) | Err(_) => break,
                }
            }
            self.flush().await;
        }
        self.flush().await;
    }

    async fn flush(&mut self) {
        let forget = lock_forget(&self.forget).take();
        if let Some(revision) = forget {
            let store = Arc::clone(&self.store);
            match tokio::task::spawn_blocking(move || store.clear()).await {
                Ok(Ok(())) => {
                    self.saved_revision = revision;
                    tracing::info!("forgot saved session");
                }
                Ok(Err(error)) => {
                    let failure = error.to_generation_error();
                    tracing::warn!(kind = %failure.kind(), detail = failure.detail(), "could not clear saved session");
                }
                Err(error) => tracing::warn!(%error, "autosave clear task failed"),
            }
        }
        self.save_if_changed().await;
    }

    async fn save_if_changed(&mut self) {
        let (revision, snapshot) = {
            let session = lock_session(&self.session);
            (session.revision(), session.snapshot())
        };
        if revision == self.saved_revision {
            return;
        }

        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            Ok(()) => {
                self.saved_revision = revision;
                self.saves.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(revision, "autosaved session");
            }
            Err(error) => tracing::warn!(%error, "autosave write task failed"),
        }
    }
}

fn lock_forget(forget: &Mutex<Option<u64>>) -> std::sync::MutexGuard<'_, Option<u64>> {
    forget.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
