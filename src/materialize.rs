//! Turns raw gateway output into artifacts.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use media_provider::{Artifact, GeneratedMedia, GenerationError, LocalBinary};
use time::OffsetDateTime;

/// Which kind of request produced an artifact; becomes the filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Edit,
    Generate,
    Batch,
}

impl Origin {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Generate => "gen",
            Self::Batch => "batch",
        }
    }
}

#[must_use]
pub fn now_unix_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[must_use]
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

/// `{prefix}-{unix_ms}[-{n}].{ext}`
#[must_use]
pub fn filename(origin: Origin, unix_ms: i64, index: Option<usize>, mime_type: &str) -> String {
    let ext = extension_for(mime_type);
    match index {
        Some(index) => format!("{}-{unix_ms}-{index}.{ext}", origin.prefix()),
        None => format!("{}-{unix_ms}.{ext}", origin.prefix()),
    }
}

pub fn materialize(
    media: GeneratedMedia,
    origin: Origin,
    unix_ms: i64,
    index: Option<usize>,
) -> Result<Artifact, GenerationError> {
    match media {
        GeneratedMedia::Encoded { mime_type, data } => {
            let bytes = BASE64_STANDARD
                .decode(data.trim())
                .map_err(|error| GenerationError::malformed(format!("undecodable media payload: {error}")))?;
            local(bytes, mime_type, origin, unix_ms, index)
        }
        GeneratedMedia::Bytes { mime_type, bytes } => local(bytes, mime_type, origin, unix_ms, index),
        GeneratedMedia::Remote { url } => {
            if url.trim().is_empty() {
                return Err(GenerationError::malformed("remote media without a URL"));
            }
            Ok(Artifact::remote(url.trim()))
        }
    }
}

/// Batch siblings are numbered from 1 in history order.
pub fn materialize_batch(
    media: Vec<GeneratedMedia>,
    unix_ms: i64,
) -> Result<Vec<Artifact>, GenerationError> {
    if media.is_empty() {
        return Err(GenerationError::malformed("batch returned no variants"));
    }
    media
        .into_iter()
        .enumerate()
        .map(|(index, item)| materialize(item, Origin::Batch, unix_ms, Some(index + 1)))
        .collect()
}

fn local(
    bytes: Vec<u8>,
    mime_type: String,
    origin: Origin,
    unix_ms: i64,
    index: Option<usize>,
) -> Result<Artifact, GenerationError> {
    if bytes.is_empty() {
        return Err(GenerationError::malformed("media payload is empty"));
    }
    let name = filename(origin, unix_ms, index, &mime_type);
    Ok(Artifact::local(LocalBinary::new(bytes, mime_type, name, unix_ms)))
}
