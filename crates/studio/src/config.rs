//! Environment and file configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use artifact_store::default_db_path;
use media_provider_gemini::GeminiGatewayConfig;
use serde::Deserialize;
use thiserror::Error;

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const PROVIDER_ENV_VAR: &str = "RETOUCH_PROVIDER";
pub const GEMINI_CONFIG_PATH_ENV_VAR: &str = "RETOUCH_GEMINI_CONFIG_PATH";
pub const DB_PATH_ENV_VAR: &str = "RETOUCH_DB_PATH";
pub const DEFAULT_LOG_FILTER: &str = "retouch=info,studio=info";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub api_key: Option<String>,
    pub provider_id: Option<String>,
    pub gemini_config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_string_opt(API_KEY_ENV_VAR),
            provider_id: env_string_opt(PROVIDER_ENV_VAR).map(|value| value.trim().to_string()),
            gemini_config_path: env_string_opt(GEMINI_CONFIG_PATH_ENV_VAR).map(PathBuf::from),
            db_path: env_string_opt(DB_PATH_ENV_VAR).map(PathBuf::from),
        }
    }

    pub fn db_path_or_default(&self, cwd: &Path) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| default_db_path(cwd))
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid gemini config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid gemini config {path}: `{field}` {reason}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        reason: &'static str,
    },
}

/// Overrides read from `RETOUCH_GEMINI_CONFIG_PATH`.
///
/// ```json
/// {
///   "base_url": "https://generativelanguage.googleapis.com/v1beta",
///   "image_model": "gemini-2.5-flash-image",
///   "pro_image_model": "gemini-3-pro-image-preview",
///   "text_model": "gemini-2.5-flash",
///   "preview_model": "gemini-2.5-flash-image",
///   "video_model": "veo-3.0-generate-001",
///   "timeout_sec": 120,
///   "poll_interval_sec": 10
/// }
/// ```
///
/// Every field is optional. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiFileConfig {
    pub base_url: Option<String>,
    pub image_model: Option<String>,
    pub pro_image_model: Option<String>,
    pub text_model: Option<String>,
    pub preview_model: Option<String>,
    pub video_model: Option<String>,
    pub timeout_sec: Option<u64>,
    pub poll_interval_sec: Option<u64>,
}

impl GeminiFileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let invalid = |field, reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            field,
            reason,
        };
        if config.timeout_sec == Some(0) {
            return Err(invalid("timeout_sec", "must be > 0"));
        }
        if config.poll_interval_sec == Some(0) {
            return Err(invalid("poll_interval_sec", "must be > 0"));
        }
        let models = [
            ("image_model", &config.image_model),
            ("pro_image_model", &config.pro_image_model),
            ("text_model", &config.text_model),
            ("preview_model", &config.preview_model),
            ("video_model", &config.video_model),
            ("base_url", &config.base_url),
        ];
        if let Some((field, _)) = models
            .iter()
            .find(|(_, value)| value.as_deref().is_some_and(|value| value.trim().is_empty()))
        {
            return Err(invalid(*field, "must not be empty"));
        }

        Ok(config)
    }

    #[must_use]
    pub fn apply(self, mut config: GeminiGatewayConfig) -> GeminiGatewayConfig {
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(timeout_sec) = self.timeout_sec {
            config = config.with_timeout(Duration::from_secs(timeout_sec));
        }
        if let Some(poll_interval_sec) = self.poll_interval_sec {
            config = config.with_poll_interval(Duration::from_secs(poll_interval_sec));
        }
        let overrides = [
            (self.image_model, &mut config.image_model),
            (self.pro_image_model, &mut config.pro_image_model),
            (self.text_model, &mut config.text_model),
            (self.preview_model, &mut config.preview_model),
            (self.video_model, &mut config.video_model),
        ];
        for (value, slot) in overrides {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }
        config
    }
}
