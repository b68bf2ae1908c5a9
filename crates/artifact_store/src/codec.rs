use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use media_provider::{Artifact, ArtifactPayload, LocalBinary};
use retouch::{SessionSnapshot, Timeline};

use crate::error::StoreError;
use crate::schema::{ArtifactRecord, SessionRecord, RECORD_VERSION};

const DEFAULT_MIME: &str = "application/octet-stream";

#[must_use]
pub fn encode_snapshot(snapshot: &SessionSnapshot) -> SessionRecord {
    let timeline = &snapshot.timeline;
    SessionRecord {
        version: RECORD_VERSION,
        history: timeline.history().iter().map(encode_artifact).collect(),
        cursor: timeline
            .cursor()
            .map_or(-1, |cursor| i64::try_from(cursor).unwrap_or(i64::MAX)),
        active_mode: snapshot.active_mode,
        timeline_kind: timeline.kind(),
        settings: snapshot.settings.clone(),
    }
}

pub fn decode_record(record: SessionRecord) -> Result<SessionSnapshot, StoreError> {
    if record.version > RECORD_VERSION {
        tracing::debug!(
            found = record.version,
            supported = RECORD_VERSION,
            "reading newer session record best-effort"
        );
    }

    let history = record
        .history
        .into_iter()
        .enumerate()
        .map(|(index, artifact)| decode_artifact(index, artifact))
        .collect::<Result<Vec<_>, _>>()?;
    let cursor = usize::try_from(record.cursor).ok();

    Ok(SessionSnapshot {
        timeline: Timeline::restore(history, cursor, record.timeline_kind),
        active_mode: record.active_mode,
        settings: record.settings.normalized(),
    })
}

fn encode_artifact(artifact: &Artifact) -> ArtifactRecord {
    match artifact.payload() {
        ArtifactPayload::LocalBinary(binary) => ArtifactRecord {
            filename: binary.filename().to_string(),
            mime_type: binary.mime_type().to_string(),
            last_modified: binary.last_modified_ms(),
            payload: to_data_url(binary.mime_type(), binary.bytes()),
            is_reference: false,
        },
        ArtifactPayload::RemoteReference(reference) => ArtifactRecord {
            filename: String::new(),
            mime_type: String::new(),
            last_modified: 0,
            payload: reference.url().to_string(),
            is_reference: true,
        },
    }
}

fn decode_artifact(index: usize, record: ArtifactRecord) -> Result<Artifact, StoreError> {
    if record.is_reference {
        if record.payload.trim().is_empty() {
            return Err(StoreError::invalid_payload(index, "reference without a URL"));
        }
        return Ok(Artifact::remote(record.payload));
    }

    let (mime_from_url, bytes) = from_data_url(&record.payload)
        .map_err(|reason| StoreError::invalid_payload(index, reason))?;
    let mime_type = if record.mime_type.is_empty() {
        mime_from_url
    } else {
        record.mime_type
    };
    let filename = if record.filename.is_empty() {
        format!("restored-{index}")
    } else {
        record.filename
    };

    Ok(Artifact::local(LocalBinary::new(
        bytes,
        mime_type,
        filename,
        record.last_modified,
    )))
}

#[must_use]
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let mime_type = if mime_type.is_empty() {
        DEFAULT_MIME
    } else {
        mime_type
    };
    format!("data:{mime_type};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Splits `data:<mime>;base64,<payload>` into mime type and bytes.
pub fn from_data_url(url: &str) -> Result<(String, Vec<u8>), String> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| "payload is not a data URL".to_string())?;
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| "data URL has no payload separator".to_string())?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| "data URL is not base64 encoded".to_string())?;
    let bytes = BASE64_STANDARD
        .decode(data)
        .map_err(|error| format!("invalid base64: {error}"))?;

    let mime_type = if mime_type.is_empty() {
        DEFAULT_MIME.to_string()
    } else {
        mime_type.to_string()
    };
    Ok((mime_type, bytes))
}
