use std::sync::Arc;

use anyhow::Context;
use artifact_store::ArtifactStore;
use retouch::{Orchestrator, Session, SessionSettings};
use studio::autosave::{Autosave, DEFAULT_DEBOUNCE};
use studio::config::{EnvConfig, DEFAULT_LOG_FILTER};
use studio::providers;
use studio::shell::Shell;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let env = EnvConfig::from_env();
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let gateway = providers::gateway_from_env(&env)?;

    let db_path = env.db_path_or_default(&cwd);
    let store = match ArtifactStore::open_or_recover(&db_path) {
        Ok(store) => Some(Arc::new(store)),
        Err(error) => {
            tracing::warn!(%error, "session persistence disabled");
            None
        }
    };

    let restored = match store.clone() {
        Some(store) => tokio::task::spawn_blocking(move || store.load())
            .await
            .context("loading saved session")?,
        None => None,
    };
    let session = match restored {
        Some(snapshot) => {
            tracing::info!(entries = snapshot.timeline.len(), "restored session");
            Session::from_snapshot(snapshot)
        }
        None => Session::new(SessionSettings::default()),
    }
    .into_shared();

    let mut shell = Shell::new(Orchestrator::new(gateway), Arc::clone(&session), std::io::stdout())
        .with_color(true);
    if let Some(store) = store {
        shell = shell.with_autosave(Autosave::spawn(store, session, DEFAULT_DEBOUNCE));
    }

    shell.run(tokio::io::BufReader::new(tokio::io::stdin())).await
}
