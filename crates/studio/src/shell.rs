use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use media_provider::GenerationError;
use retouch::{
    lock_session, Artifact, EditingMode, GenerationRequest, Orchestrator, OrchestratorError,
    PreviewHandle, PreviewSlot, SharedSession,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;

use crate::autosave::Autosave;
use crate::commands::{parse_command, BatchSize, Command, GenerateArgs, HELP};
use crate::media;

/// How long a failure banner stays up.
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    orchestrator: Orchestrator,
    session: SharedSession,
    slot: PreviewSlot,
    draft: Option<PreviewHandle>,
    autosave: Option<Autosave>,
    banner: Option<JoinHandle<()>>,
    banner_timeout: Duration,
    color: bool,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(orchestrator: Orchestrator, session: SharedSession, out: W) -> Self {
        Self {
            orchestrator,
            session,
            slot: PreviewSlot::new(),
            draft: None,
            autosave: None,
            banner: None,
            banner_timeout: BANNER_TIMEOUT,
            color: false,
            out,
        }
    }

    #[must_use]
    pub fn with_autosave(mut self, autosave: Autosave) -> Self {
        self.autosave = Some(autosave);
        self
    }

    /// Temp files for display handles go under `dir`.
    #[must_use]
    pub fn with_preview_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.slot = PreviewSlot::in_dir(dir);
        self
    }

    /// Tint the status line with the accent color setting.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn active_display(&self) -> Option<&PreviewHandle> {
        self.slot.current()
    }

    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> anyhow::Result<()> {
        let profile = self.orchestrator.gateway().profile();
        writeln!(
            self.out,
            "retouch studio ({} / {}) - /help for commands",
            profile.provider_id, profile.image_model
        )?;
        if !profile.authenticated {
            writeln!(self.out, "warning: no API key configured, generation is disabled")?;
        }
        self.render_status()?;

        let mut lines = input.lines();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;
            let Some(line) = lines.next_line().await.context("reading input")? else {
                break;
            };
            if self.handle_line(&line).await? == Flow::Quit {
                break;
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Handles one input line. Errors are only returned for output failures.
    pub async fn handle_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        let Some(command) = parse_command(line) else {
            return Ok(Flow::Continue);
        };
        tracing::debug!(?command, "shell command");

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Unknown(name) => writeln!(self.out, "unknown command {name}, try /help")?,
            Command::Invalid(message) => writeln!(self.out, "{message}")?,
            Command::Upload(path) => self.upload(&path).await?,
            Command::Mode(None) => {
                let mode = lock_session(&self.session).active_mode();
                writeln!(self.out, "mode: {mode}")?;
            }
            Command::Mode(Some(mode)) => lock_session(&self.session).set_active_mode(mode),
            Command::Generate(args) => self.generate(args).await?,
            Command::Undo => {
                if !lock_session(&self.session).undo() {
                    writeln!(self.out, "nothing to undo")?;
                }
            }
            Command::Redo => {
                if !lock_session(&self.session).redo() {
                    writeln!(self.out, "nothing to redo")?;
                }
            }
            Command::Reset => {
                lock_session(&self.session).reset();
                self.draft = None;
            }
            Command::Forget => {
                let revision = {
                    let mut session = lock_session(&self.session);
                    session.reset();
                    session.revision()
                };
                self.draft = None;
                match &self.autosave {
                    Some(autosave) => {
                        autosave.forget(revision);
                        writeln!(self.out, "saved session will be deleted")?;
                    }
                    None => writeln!(self.out, "persistence is off, nothing to delete")?,
                }
            }
            Command::Describe => {
                let result = self.orchestrator.describe(&self.session).await;
                self.print_text(result)?;
            }
            Command::ExtractStyle => {
                let result = self.orchestrator.extract_style(&self.session).await;
                self.print_text(result)?;
            }
            Command::Refine(text) => {
                let result = self.orchestrator.refine_prompt(&text).await;
                self.print_text(result)?;
            }
            Command::Preview(text) => self.preview(&text).await?,
            Command::Set { key, value } => {
                let result = lock_session(&self.session).update_settings(|settings| settings.set(&key, &value));
                match result {
                    Ok(()) => writeln!(self.out, "{key} = {value}")?,
                    Err(error) => writeln!(self.out, "{error}")?,
                }
            }
            Command::Settings => {
                let settings = lock_session(&self.session).settings().clone();
                writeln!(self.out, "{}", serde_json::to_string_pretty(&settings)?)?;
            }
            Command::Status => {}
            Command::Export(path) => self.export(&path).await?,
            Command::Dismiss => {
                lock_session(&self.session).dismiss_error();
                if let Some(banner) = self.banner.take() {
                    banner.abort();
                }
            }
        }

        self.after_command()?;
        Ok(Flow::Continue)
    }

    /// Stops autosave after flushing pending changes.
    pub async fn shutdown(&mut self) {
        if let Some(banner) = self.banner.take() {
            banner.abort();
        }
        if let Some(autosave) = self.autosave.take() {
            let saves = autosave.shutdown().await;
            tracing::debug!(saves, "autosave stopped");
        }
        self.draft = None;
        self.slot.release();
    }

    async fn upload(&mut self, path: &Path) -> anyhow::Result<()> {
        match media::load_binary(path).await {
            Ok(binary) => {
                lock_session(&self.session).upload(Artifact::local(binary));
                self.draft = None;
            }
            Err(error) => self.report_failure("upload failed", &error)?,
        }
        Ok(())
    }

    async fn generate(&mut self, args: GenerateArgs) -> anyhow::Result<()> {
        let request = match self.build_request(args).await {
            Ok(request) => request,
            Err(error) => return self.report_failure("cannot start generation", &error),
        };

        let live_preview = lock_session(&self.session).settings().live_preview;
        let preview_text =
            (live_preview && !request.mode.is_video()).then(|| request.instruction.clone());

        // The draft races the real request and is dropped if the result lands first.
        let result = {
            let submit = self.orchestrator.submit(&self.session, request);
            tokio::pin!(submit);
            match preview_text {
                Some(text) => {
                    let preview = self.orchestrator.preview(&text);
                    tokio::pin!(preview);
                    tokio::select! {
                        result = &mut submit => result,
                        draft = &mut preview => {
                            show_draft(&mut self.out, &mut self.draft, draft)?;
                            submit.await
                        }
                    }
                }
                None => submit.await,
            }
        };

        match result {
            Ok(applied) => {
                self.clear_banner();
                writeln!(self.out, "{:?}: {} new", applied.mutation, applied.added)?;
            }
            Err(OrchestratorError::Busy) => {
                writeln!(self.out, "a generation is already running")?;
            }
            Err(error) => self.show_banner(error.user_message()),
        }
        Ok(())
    }

    async fn build_request(&self, args: GenerateArgs) -> Result<GenerationRequest, GenerationError> {
        let (active_mode, batch_size) = {
            let session = lock_session(&self.session);
            (session.active_mode(), session.settings().batch_size)
        };
        let mode = args.mode.unwrap_or(active_mode);

        let mut request = GenerationRequest::new(mode, args.instruction).with_params(args.params);
        if let Some(reference) = args.reference {
            request = request.with_reference(media::load_reference(&reference).await?);
        }
        if let Some(mask) = args.mask {
            request = request.with_mask(media::load_binary(&mask).await?);
        }
        match args.batch {
            Some(BatchSize::Count(count)) => request = request.with_batch_count(count),
            Some(BatchSize::FromSettings) => {
                request = request.with_batch_count(batch_size as usize);
            }
            None => {}
        }
        if args.force_new || mode == EditingMode::Generate {
            request = request.forcing_new();
        }
        if args.use_original {
            request = request.from_original();
        }
        Ok(request)
    }

    async fn preview(&mut self, text: &str) -> anyhow::Result<()> {
        let draft = self.orchestrator.preview(text).await;
        show_draft(&mut self.out, &mut self.draft, draft)
    }

    /// Puts a local failure on the session banner, the same way a failed
    /// generation is shown.
    fn report_failure(&mut self, context: &str, error: &GenerationError) -> anyhow::Result<()> {
        tracing::warn!(kind = %error.kind(), detail = error.detail(), "{context}");
        let message = error.user_message();
        lock_session(&self.session).fail(message.clone());
        writeln!(self.out, "{context}: {message}")?;
        self.show_banner(message);
        Ok(())
    }

    async fn export(&mut self, path: &Path) -> anyhow::Result<()> {
        let active = lock_session(&self.session).timeline().active().cloned();
        let Some(active) = active else {
            writeln!(self.out, "nothing to export")?;
            return Ok(());
        };
        match media::export(&active, path).await {
            Ok(()) => writeln!(self.out, "wrote {}", path.display())?,
            Err(error) => writeln!(self.out, "export failed: {error:#}")?,
        }
        Ok(())
    }

    fn print_text(&mut self, result: Result<String, OrchestratorError>) -> anyhow::Result<()> {
        match result {
            Ok(text) => writeln!(self.out, "{text}")?,
            Err(error) => writeln!(self.out, "error: {}", error.user_message())?,
        }
        Ok(())
    }

    /// Shows the session error and clears it after the banner timeout unless
    /// a newer failure replaced it.
    fn show_banner(&mut self, message: String) {
        if let Some(previous) = self.banner.take() {
            previous.abort();
        }
        let session = Arc::clone(&self.session);
        let timeout = self.banner_timeout;
        self.banner = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut session = lock_session(&session);
            if session.status().error() == Some(message.as_str()) {
                session.dismiss_error();
            }
        }));
    }

    fn clear_banner(&mut self) {
        if let Some(banner) = self.banner.take() {
            banner.abort();
        }
    }

    fn after_command(&mut self) -> anyhow::Result<()> {
        let (active, revision) = {
            let session = lock_session(&self.session);
            (session.timeline().active().cloned(), session.revision())
        };
        if let Err(error) = self.slot.sync(active.as_ref()) {
            tracing::warn!(%error, "could not materialize display handle");
        }
        if let Some(autosave) = &self.autosave {
            autosave.notify(revision);
        }
        self.render_status()
    }

    fn render_status(&mut self) -> anyhow::Result<()> {
        let line = {
            let session = lock_session(&self.session);
            let timeline = session.timeline();
            let mut line = format!("[{}]", session.active_mode());
            match timeline.position_label() {
                Some(label) => line.push_str(&format!(" {label}")),
                None => line.push_str(" empty"),
            }
            if let Some(handle) = self.slot.current() {
                line.push_str(&format!(" {}", handle.location()));
            }
            if session.settings().compare_original && timeline.len() > 1 {
                if let Some(original) = timeline.original() {
                    line.push_str(&format!(" (original: {})", original.label()));
                }
            }
            if session.status().is_loading() {
                line.push_str(" working...");
            }
            if let Some(error) = session.status().error() {
                line.push_str(&format!("\n! {error}"));
            }
            if self.color {
                accent(&session.settings().accent_color, &line)
            } else {
                line
            }
        };
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

fn show_draft<W: Write>(
    out: &mut W,
    slot: &mut Option<PreviewHandle>,
    draft: Option<Artifact>,
) -> anyhow::Result<()> {
    let Some(artifact) = draft else {
        writeln!(out, "no preview available")?;
        return Ok(());
    };
    *slot = None;
    match PreviewHandle::create(&artifact, None) {
        Ok(handle) => {
            writeln!(out, "draft: {}", handle.location())?;
            *slot = Some(handle);
        }
        Err(error) => tracing::warn!(%error, "could not materialize draft"),
    }
    Ok(())
}

/// Wraps `text` in a 24-bit foreground color escape for a `#rrggbb` color.
fn accent(color: &str, text: &str) -> String {
    let channel = |range: std::ops::Range<usize>| {
        color
            .get(range)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
    };
    match (channel(1..3), channel(3..5), channel(5..7)) {
        (Some(r), Some(g), Some(b)) => format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m"),
        _ => text.to_string(),
    }
}
