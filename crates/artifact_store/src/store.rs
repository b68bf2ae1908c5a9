use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use retouch::materialize::now_unix_ms;
use retouch::SessionSnapshot;
use rusqlite::{params, Connection, OptionalExtension};

use crate::codec::{decode_record, encode_snapshot};
use crate::error::StoreError;
use crate::paths::database_files;
use crate::schema::{SessionRecord, CREATE_KV_TABLE, SESSION_KEY};

/// Single-record session persistence in a local SQLite key-value table.
///
/// `save` and `load` never fail the caller: errors are logged and the session
/// keeps working in memory. Use the `try_` variants to observe failures.
pub struct ArtifactStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl ArtifactStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::io("creating store directory", parent, source))?;
        }

        let conn = Connection::open(&path)
            .map_err(|source| StoreError::sqlite("opening database", source))?;
        conn.execute_batch(CREATE_KV_TABLE)
            .map_err(|source| StoreError::sqlite("creating kv table", source))?;

        tracing::debug!(path = %path.display(), "opened artifact store");
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Opens the store, deleting and recreating a database file SQLite cannot read.
    pub fn open_or_recover(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        match Self::open(path) {
            Err(error) if error.is_corrupt() => {
                tracing::warn!(%error, path = %path.display(), "discarding unreadable session database");
                nuke_path(path);
                Self::open(path)
            }
            result => result,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let record = encode_snapshot(snapshot);
        let value = serde_json::to_string(&record).map_err(StoreError::Encode)?;

        self.conn()
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![SESSION_KEY, value, now_unix_ms()],
            )
            .map_err(|source| StoreError::sqlite("writing session record", source))?;
        Ok(())
    }

    /// Best-effort save.
    pub fn save(&self, snapshot: &SessionSnapshot) {
        match self.try_save(snapshot) {
            Ok(()) => tracing::debug!(
                entries = snapshot.timeline.len(),
                "saved session record"
            ),
            Err(error) => {
                let failure = error.to_generation_error();
                tracing::warn!(kind = %failure.kind(), detail = failure.detail(), "failed to save session record");
            }
        }
    }

    pub fn try_load(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        let value: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![SESSION_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|source| StoreError::sqlite("reading session record", source))?;

        let Some(value) = value else {
            return Ok(None);
        };
        let record: SessionRecord = serde_json::from_str(&value).map_err(StoreError::Decode)?;
        decode_record(record).map(Some)
    }

    /// Best-effort load. Missing and unreadable records both start a fresh
    /// session; a record that cannot be decoded is removed so the next save
    /// starts clean.
    pub fn load(&self) -> Option<SessionSnapshot> {
        let error = match self.try_load() {
            Ok(snapshot) => return snapshot,
            Err(error) => error,
        };
        let failure = error.to_generation_error();
        tracing::warn!(kind = %failure.kind(), detail = failure.detail(), "ignoring unreadable session record");
        if error.is_corrupt() {
            if let Err(error) = self.clear() {
                tracing::warn!(%error, "could not remove unreadable session record");
            }
        }
        None
    }

    /// Removes the stored record. Clearing an empty store is a no-op.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![SESSION_KEY])
            .map_err(|source| StoreError::sqlite("clearing session record", source))?;
        Ok(())
    }

    /// Closes the store and deletes the database with its sidecar files.
    pub fn nuke(self) {
        let Self { path, conn } = self;
        let conn = conn.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err((_, source)) = conn.close() {
            tracing::warn!(error = %source, "closing database before removal failed");
        }
        nuke_path(&path)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Deletes a database and its sidecars without opening it. Failures are logged.
pub fn nuke_path(path: &Path) {
    for file in database_files(path) {
        match fs::remove_file(&file) {
            Ok(()) => tracing::debug!(path = %file.display(), "removed store file"),
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                let error = StoreError::io("removing store file", file, source);
                tracing::warn!(%error, "store removal incomplete");
            }
        }
    }
}
