//! Line-driven shell for the retouch editor.
//!
//! ## Provider bootstrap
//!
//! - `RETOUCH_PROVIDER=gemini` (default) talks to the Gemini API. The key is
//!   read from `GEMINI_API_KEY`; without it the shell starts and every
//!   generation fails with an authentication message.
//! - `RETOUCH_PROVIDER=mock` uses the deterministic in-process gateway.
//!
//! `RETOUCH_GEMINI_CONFIG_PATH` may point at a JSON file overriding the base
//! URL, model ids, request timeout and video poll interval; see
//! [`config::GeminiFileConfig`]. Unknown fields are rejected.
//!
//! ## Persistence
//!
//! The session is restored from `RETOUCH_DB_PATH` (default
//! `<cwd>/.retouch/session.sqlite3`) at startup and written back through
//! [`autosave::Autosave`] after changes settle. A database file SQLite cannot
//! read is deleted and recreated; a record that fails to decode is dropped.
//! `/forget` deletes the saved record on demand.
//!
//! Logging goes through `tracing`; set `RUST_LOG` to adjust the filter.

pub mod autosave;
pub mod commands;
pub mod config;
pub mod media;
pub mod providers;
pub mod shell;
