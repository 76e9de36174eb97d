//! Named printer presets.
//!
//! A preset fixes the naming, extension and bit depth a printer controller
//! expects. Size and copies stay with the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TransformSpec;

/// Known printer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Xaar XPM: 8-bit grayscale BMP layers
    XaarXpm,
    /// Meteor HDC: black & white TIFF layers, stored as 8-bit gray holding only 0 and 255
    MeteorHdc,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::XaarXpm, Preset::MeteorHdc];

    /// Stable identifier used on the command line and in config files.
    pub fn id(self) -> &'static str {
        match self {
            Self::XaarXpm => "xaar-xpm",
            Self::MeteorHdc => "meteor-hdc",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::XaarXpm => "Xaar XPM (8-bit BMP)",
            Self::MeteorHdc => "Meteor HDC (black & white TIFF)",
        }
    }

    /// The transform this preset implies.
    pub fn spec(self) -> TransformSpec {
        match self {
            Self::XaarXpm => TransformSpec::new()
                .name_format("Layer")
                .extension(".bmp")
                .bit_depth(8),
            Self::MeteorHdc => TransformSpec::new()
                .name_format("Layer")
                .extension(".tif")
                .bit_depth(1),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown preset '{s}' (expected one of: {})",
                    Self::ALL.map(|p| p.id()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xaar_spec() {
        let spec = Preset::XaarXpm.spec();
        assert_eq!(spec.name_format.as_deref(), Some("Layer"));
        assert_eq!(spec.extension.as_deref(), Some(".bmp"));
        assert_eq!(spec.bit_depth, Some(8));
        assert_eq!(spec.width, None);
        assert_eq!(spec.copies, 1);
    }

    #[test]
    fn test_meteor_spec() {
        let spec = Preset::MeteorHdc.spec();
        assert_eq!(spec.extension.as_deref(), Some(".tif"));
        assert_eq!(spec.bit_depth, Some(1));
    }

    #[test]
    fn test_labels_match_written_format() {
        assert_eq!(Preset::XaarXpm.label(), "Xaar XPM (8-bit BMP)");
        assert_eq!(Preset::MeteorHdc.label(), "Meteor HDC (black & white TIFF)");
        assert!(!Preset::MeteorHdc.label().contains("1-bit"));
    }

    #[test]
    fn test_explicit_fields_win_over_preset() {
        let spec = TransformSpec::new()
            .bit_depth(24)
            .copies(4)
            .or(&Preset::MeteorHdc.spec());
        assert_eq!(spec.bit_depth, Some(24));
        assert_eq!(spec.copies, 4);
        assert_eq!(spec.extension.as_deref(), Some(".tif"));
        assert_eq!(spec.name_format.as_deref(), Some("Layer"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("xaar-xpm".parse::<Preset>(), Ok(Preset::XaarXpm));
        assert_eq!("METEOR-HDC".parse::<Preset>(), Ok(Preset::MeteorHdc));
        assert!("kyocera".parse::<Preset>().unwrap_err().contains("xaar-xpm"));
    }
}
