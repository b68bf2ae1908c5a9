//! Persisted JSON shape of a session.
//!
//! Every field except an artifact's payload has a default, so records written by
//! older builds load unchanged. Unknown fields are ignored.

use media_provider::EditingMode;
use retouch::{SessionSettings, TimelineKind};
use serde::{Deserialize, Serialize};

pub const RECORD_VERSION: u32 = 1;
pub const SESSION_KEY: &str = "current_session";

pub const CREATE_KV_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT 0
)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default = "record_version")]
    pub version: u32,
    #[serde(default)]
    pub history: Vec<ArtifactRecord>,
    /// `-1` when the history is empty.
    #[serde(default = "no_cursor")]
    pub cursor: i64,
    #[serde(default)]
    pub active_mode: EditingMode,
    #[serde(default)]
    pub timeline_kind: TimelineKind,
    #[serde(default)]
    pub settings: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub last_modified: i64,
    /// A `data:` URL for local media, the bare URL for references.
    pub payload: String,
    #[serde(default)]
    pub is_reference: bool,
}

fn record_version() -> u32 {
    RECORD_VERSION
}

fn no_cursor() -> i64 {
    -1
}
