use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Editing surface a request originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingMode {
    /// Free-form instruction applied to the current image.
    #[default]
    Edit,
    /// Photographic adjustments that keep the composition.
    Adjust,
    /// Restyle the current image.
    Style,
    /// Flat vector illustration output.
    Vector,
    /// Masked region edits.
    Inpaint,
    /// Text-to-image without a source.
    Generate,
    Video,
}

impl EditingMode {
    pub const ALL: [EditingMode; 7] = [
        Self::Edit,
        Self::Adjust,
        Self::Style,
        Self::Vector,
        Self::Inpaint,
        Self::Generate,
        Self::Video,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Adjust => "adjust",
            Self::Style => "style",
            Self::Vector => "vector",
            Self::Inpaint => "inpaint",
            Self::Generate => "generate",
            Self::Video => "video",
        }
    }

    #[must_use]
    pub fn is_video(self) -> bool {
        matches!(self, Self::Video)
    }
}

impl fmt::Display for EditingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditingMode {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| GenerationError::unsupported(format!("unknown editing mode '{value}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        Self::Square,
        Self::Portrait3x4,
        Self::Landscape4x3,
        Self::Portrait9x16,
        Self::Landscape16x9,
        Self::Ultrawide,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
            Self::Ultrawide => "21:9",
        }
    }

    /// Video jobs only accept the two 16:9 orientations.
    #[must_use]
    pub fn supports_video(self) -> bool {
        matches!(self, Self::Landscape16x9 | Self::Portrait9x16)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == trimmed)
            .ok_or_else(|| GenerationError::unsupported(format!("unsupported aspect ratio '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::{AspectRatio, EditingMode};
    use crate::FailureKind;

    #[test]
    fn editing_mode_ids_are_stable_and_parse_case_insensitively() {
        for mode in EditingMode::ALL {
            assert_eq!(mode.as_str().parse::<EditingMode>(), Ok(mode));
        }
        assert_eq!("  Video ".parse::<EditingMode>(), Ok(EditingMode::Video));

        let json = serde_json::to_string(&EditingMode::Inpaint).expect("serialize mode");
        assert_eq!(json, "\"inpaint\"");
    }

    #[test]
    fn unknown_aspect_ratio_is_unsupported_input() {
        let error = "5:4".parse::<AspectRatio>().expect_err("5:4 is not offered");
        assert_eq!(error.kind(), FailureKind::UnsupportedInput);
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::Landscape16x9));
    }

    #[test]
    fn only_sixteen_by_nine_orientations_support_video() {
        let video: Vec<_> = AspectRatio::ALL
            .into_iter()
            .filter(|ratio| ratio.supports_video())
            .collect();
        assert_eq!(
            video,
            vec![AspectRatio::Portrait9x16, AspectRatio::Landscape16x9]
        );
    }
}
