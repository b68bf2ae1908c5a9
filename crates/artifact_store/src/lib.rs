//! Local persistence for the editing session: the timeline with its media,
//! the active mode and the user settings, kept as one JSON record in SQLite.

mod codec;
mod error;
mod paths;
mod schema;
mod store;

pub use codec::{decode_record, encode_snapshot, from_data_url, to_data_url};
pub use error::StoreError;
pub use paths::{database_files, default_db_path, DB_DIR, DB_FILE};
pub use schema::{ArtifactRecord, SessionRecord, RECORD_VERSION, SESSION_KEY};
pub use store::{nuke_path, ArtifactStore};
