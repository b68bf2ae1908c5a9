//! Display handles for the active artifact.
//!
//! A shell renders from a handle rather than from artifact bytes. Local media
//! is written to a temp file that is removed when the handle drops.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use media_provider::{Artifact, ArtifactId, ArtifactPayload};
use tempfile::NamedTempFile;

use crate::materialize::extension_for;

#[derive(Debug)]
enum HandleTarget {
    File(NamedTempFile),
    Url(String),
}

#[derive(Debug)]
pub struct PreviewHandle {
    artifact: ArtifactId,
    target: HandleTarget,
}

impl PreviewHandle {
    /// Materializes `artifact` into a handle. Temp files go to `dir`, or the
    /// system temp directory when `dir` is `None`.
    pub fn create(artifact: &Artifact, dir: Option<&Path>) -> io::Result<Self> {
        let target = match artifact.payload() {
            ArtifactPayload::RemoteReference(reference) => HandleTarget::Url(reference.url().to_string()),
            ArtifactPayload::LocalBinary(binary) => {
                let suffix = format!(".{}", extension_for(binary.mime_type()));
                let mut builder = tempfile::Builder::new();
                builder.prefix("retouch-").suffix(&suffix);
                let mut file = match dir {
                    Some(dir) => builder.tempfile_in(dir)?,
                    None => builder.tempfile()?,
                };
                file.write_all(binary.bytes())?;
                file.flush()?;
                HandleTarget::File(file)
            }
        };

        Ok(Self {
            artifact: artifact.id(),
            target,
        })
    }

    #[must_use]
    pub fn artifact_id(&self) -> ArtifactId {
        self.artifact
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            HandleTarget::File(file) => Some(file.path()),
            HandleTarget::Url(_) => None,
        }
    }

    /// Something a viewer can open: a file path or a URL.
    #[must_use]
    pub fn location(&self) -> String {
        match &self.target {
            HandleTarget::File(file) => file.path().display().to_string(),
            HandleTarget::Url(url) => url.clone(),
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        tracing::trace!(artifact = %self.artifact, "preview handle released");
    }
}

/// Holds at most one handle, always for the active artifact.
#[derive(Debug, Default)]
pub struct PreviewSlot {
    dir: Option<PathBuf>,
    current: Option<PreviewHandle>,
}

impl PreviewSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            current: None,
        }
    }

    /// Points the slot at `active`. The previous handle is released whenever
    /// the active artifact changes; an unchanged artifact keeps its handle.
    pub fn sync(&mut self, active: Option<&Artifact>) -> io::Result<Option<&PreviewHandle>> {
        let unchanged = match (active, &self.current) {
            (Some(artifact), Some(handle)) => handle.artifact_id() == artifact.id(),
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            self.current = None;
            if let Some(artifact) = active {
                self.current = Some(PreviewHandle::create(artifact, self.dir.as_deref())?);
            }
        }
        Ok(self.current.as_ref())
    }

    #[must_use]
    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    pub fn release(&mut self) {
        self.current = None;
    }
}
