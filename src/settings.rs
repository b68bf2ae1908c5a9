//! User-tunable session settings.

use media_provider::MAX_BATCH_COUNT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_VERSION: u32 = 1;
pub const DEFAULT_MASK_COLOR: &str = "#ff3b6b";
pub const DEFAULT_ACCENT_COLOR: &str = "#6366f1";
pub const DEFAULT_BATCH_SIZE: u32 = 4;

/// Keys accepted by [`SessionSettings::set`].
pub const SETTING_KEYS: [&str; 6] = [
    "live_preview",
    "compare_original",
    "mask_color",
    "accent_color",
    "pro_tier",
    "batch_size",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Every field has a default, so older persisted records load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSettings {
    pub version: u32,
    pub live_preview: bool,
    pub compare_original: bool,
    pub mask_color: String,
    pub accent_color: String,
    pub pro_tier: bool,
    pub batch_size: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            live_preview: false,
            compare_original: false,
            mask_color: DEFAULT_MASK_COLOR.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            pro_tier: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SessionSettings {
    /// Repairs values a hand-edited or older record may carry.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !is_hex_color(&self.mask_color) {
            self.mask_color = defaults.mask_color;
        }
        if !is_hex_color(&self.accent_color) {
            self.accent_color = defaults.accent_color;
        }
        self.batch_size = self.batch_size.clamp(1, MAX_BATCH_COUNT as u32);
        self.version = SETTINGS_VERSION;
        self
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        match key.trim() {
            "live_preview" => self.live_preview = parse_flag("live_preview", value)?,
            "compare_original" => self.compare_original = parse_flag("compare_original", value)?,
            "pro_tier" => self.pro_tier = parse_flag("pro_tier", value)?,
            "mask_color" => self.mask_color = parse_color("mask_color", value)?,
            "accent_color" => self.accent_color = parse_color("accent_color", value)?,
            "batch_size" => {
                self.batch_size = value
                    .parse::<u32>()
                    .ok()
                    .filter(|size| (1..=MAX_BATCH_COUNT as u32).contains(size))
                    .ok_or_else(|| SettingsError::InvalidValue {
                        key: "batch_size",
                        value: value.to_string(),
                        reason: "expected a number from 1 to 8",
                    })?;
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected on or off",
        }),
    }
}

fn parse_color(key: &'static str, value: &str) -> Result<String, SettingsError> {
    if is_hex_color(value) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(SettingsError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected #rrggbb",
        })
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|ch| ch.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = SessionSettings::default();

        assert_eq!(settings.version, 1);
        assert!(!settings.live_preview);
        assert!(!settings.compare_original);
        assert_eq!(settings.mask_color, "#ff3b6b");
        assert_eq!(settings.accent_color, "#6366f1");
        assert!(!settings.pro_tier);
        assert_eq!(settings.batch_size, 4);
    }

    #[test]
    fn set_parses_flags_colors_and_batch_size() {
        let mut settings = SessionSettings::default();

        settings.set("live_preview", "on").expect("flag");
        settings.set("accent_color", "#00FF88").expect("color");
        settings.set("batch_size", "8").expect("batch size");

        assert!(settings.live_preview);
        assert_eq!(settings.accent_color, "#00ff88");
        assert_eq!(settings.batch_size, 8);
    }

    #[test]
    fn set_rejects_unknown_keys_and_out_of_range_values() {
        let mut settings = SessionSettings::default();

        assert_eq!(
            settings.set("theme", "dark"),
            Err(SettingsError::UnknownKey("theme".to_string()))
        );
        assert!(settings.set("batch_size", "9").is_err());
        assert!(settings.set("mask_color", "red").is_err());
        assert_eq!(settings, SessionSettings::default());
    }

    #[test]
    fn normalized_repairs_bad_values() {
        let settings = SessionSettings {
            version: 0,
            mask_color: "nope".to_string(),
            batch_size: 40,
            ..SessionSettings::default()
        }
        .normalized();

        assert_eq!(settings.mask_color, DEFAULT_MASK_COLOR);
        assert_eq!(settings.batch_size, 8);
        assert_eq!(settings.version, SETTINGS_VERSION);
    }
}
