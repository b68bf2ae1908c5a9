use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// Identity of one artifact. Two artifacts are "the same" only when their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Media bytes owned by the session.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalBinary {
    bytes: Arc<[u8]>,
    mime_type: String,
    filename: String,
    last_modified_ms: i64,
}

impl LocalBinary {
    #[must_use]
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        mime_type: impl Into<String>,
        filename: impl Into<String>,
        last_modified_ms: i64,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            filename: filename.into(),
            last_modified_ms,
        }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn last_modified_ms(&self) -> i64 {
        self.last_modified_ms
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

// Payloads can be megabytes; keep debug output to the metadata.
impl fmt::Debug for LocalBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBinary")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("filename", &self.filename)
            .field("last_modified_ms", &self.last_modified_ms)
            .finish()
    }
}

/// Media that lives at a provider-owned URL and was not rehosted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReference {
    url: String,
}

impl RemoteReference {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPayload {
    LocalBinary(LocalBinary),
    RemoteReference(RemoteReference),
}

/// One immutable unit of media in a session.
///
/// Artifacts are never edited in place. Cloning is cheap: the byte payload is
/// shared, and the clone keeps the original identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    id: ArtifactId,
    payload: ArtifactPayload,
}

impl Artifact {
    #[must_use]
    pub fn local(binary: LocalBinary) -> Self {
        Self {
            id: ArtifactId::new(),
            payload: ArtifactPayload::LocalBinary(binary),
        }
    }

    #[must_use]
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            id: ArtifactId::new(),
            payload: ArtifactPayload::RemoteReference(RemoteReference::new(url)),
        }
    }

    #[must_use]
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    #[must_use]
    pub fn payload(&self) -> &ArtifactPayload {
        &self.payload
    }

    /// Returns the owned bytes, or `None` for a remote reference.
    #[must_use]
    pub fn as_local(&self) -> Option<&LocalBinary> {
        match &self.payload {
            ArtifactPayload::LocalBinary(binary) => Some(binary),
            ArtifactPayload::RemoteReference(_) => None,
        }
    }

    #[must_use]
    pub fn as_remote(&self) -> Option<&RemoteReference> {
        match &self.payload {
            ArtifactPayload::RemoteReference(reference) => Some(reference),
            ArtifactPayload::LocalBinary(_) => None,
        }
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self.payload, ArtifactPayload::RemoteReference(_))
    }

    /// Short label for listings: the filename, or the URL of a reference.
    #[must_use]
    pub fn label(&self) -> &str {
        match &self.payload {
            ArtifactPayload::LocalBinary(binary) => binary.filename(),
            ArtifactPayload::RemoteReference(reference) => reference.url(),
        }
    }
}
