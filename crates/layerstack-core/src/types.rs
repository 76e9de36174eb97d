//! Core data types for the layerstack conversion pipeline.
//!
//! These types describe what a run is asked to do (`TransformSpec`), the
//! validated parameter values it works with (`Dimension`, `BitDepth`), and
//! what it produced (`OutputArtifact`, `LayerRecord`).

use image::ColorType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Axis, TransformError, TransformResult};

/// Name of the directory that receives converted layers.
pub const OUTPUT_DIR_NAME: &str = "output";

/// Digits used when a layer index is embedded in a generated name.
pub const LAYER_INDEX_WIDTH: usize = 5;

/// Build a generated layer name: `<format>_<zero-padded index>`.
///
/// Indices wider than five digits are written in full.
pub fn layer_name(format: &str, layer: u64) -> String {
    format!("{format}_{layer:0width$}", width = LAYER_INDEX_WIDTH)
}

/// A validated, positive pixel dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dimension(u32);

impl Dimension {
    /// Validate a raw value for the given axis.
    pub fn new(axis: Axis, value: i64) -> TransformResult<Self> {
        match u32::try_from(value) {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(TransformError::InvalidDimension {
                axis,
                value: value.to_string(),
            }),
        }
    }

    /// Parse a textual value (e.g. from a prompt or flag) for the given axis.
    ///
    /// Anything that is not a plain integer fails the same way a
    /// non-positive value does.
    pub fn parse(axis: Axis, text: &str) -> TransformResult<Self> {
        let value = text
            .trim()
            .parse::<i64>()
            .map_err(|_| TransformError::InvalidDimension {
                axis,
                value: text.to_string(),
            })?;
        Self::new(axis, value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Output bit depth, one of the four recognized codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum BitDepth {
    /// 1-bit black and white
    Mono,
    /// 8-bit grayscale
    Gray,
    /// 24-bit true colour
    Rgb,
    /// 24-bit true colour with 8-bit alpha
    Rgba,
}

impl BitDepth {
    /// All depths, in ascending order.
    pub const ALL: [BitDepth; 4] = [BitDepth::Mono, BitDepth::Gray, BitDepth::Rgb, BitDepth::Rgba];

    /// Numeric depth code.
    pub fn bits(self) -> u8 {
        match self {
            BitDepth::Mono => 1,
            BitDepth::Gray => 8,
            BitDepth::Rgb => 24,
            BitDepth::Rgba => 32,
        }
    }

    /// Canonical color mode produced by converting to this depth.
    pub fn color_mode(self) -> ColorMode {
        match self {
            BitDepth::Mono => ColorMode::Mono,
            BitDepth::Gray => ColorMode::Gray8,
            BitDepth::Rgb => ColorMode::Rgb24,
            BitDepth::Rgba => ColorMode::Rgba32,
        }
    }
}

impl TryFrom<i64> for BitDepth {
    type Error = TransformError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BitDepth::Mono),
            8 => Ok(BitDepth::Gray),
            24 => Ok(BitDepth::Rgb),
            32 => Ok(BitDepth::Rgba),
            other => Err(TransformError::InvalidBitDepth(other.to_string())),
        }
    }
}

impl From<BitDepth> for i64 {
    fn from(depth: BitDepth) -> Self {
        i64::from(depth.bits())
    }
}

impl FromStr for BitDepth {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| TransformError::InvalidBitDepth(s.to_string()))?;
        Self::try_from(value)
    }
}

impl std::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Color/bit-depth layout of a working raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Bilevel black and white (stored as 8-bit luma holding only 0 and 255)
    Mono,
    /// 8-bit grayscale
    Gray8,
    /// 8 bits per channel RGB
    Rgb24,
    /// 8 bits per channel RGBA
    Rgba32,
    /// Any other layout the codec decoded (16-bit, float, gray+alpha, ...)
    Other(ColorType),
}

impl ColorMode {
    /// Mode of a freshly decoded raster.
    ///
    /// The codec has no 1-bit buffer type, so decoded bilevel images report
    /// `Gray8`; `Mono` only results from an explicit depth conversion.
    pub fn from_color_type(color: ColorType) -> Self {
        match color {
            ColorType::L8 => ColorMode::Gray8,
            ColorType::Rgb8 => ColorMode::Rgb24,
            ColorType::Rgba8 => ColorMode::Rgba32,
            other => ColorMode::Other(other),
        }
    }

    /// The depth code this mode corresponds to, if it is a canonical one.
    pub fn bit_depth(self) -> Option<BitDepth> {
        match self {
            ColorMode::Mono => Some(BitDepth::Mono),
            ColorMode::Gray8 => Some(BitDepth::Gray),
            ColorMode::Rgb24 => Some(BitDepth::Rgb),
            ColorMode::Rgba32 => Some(BitDepth::Rgba),
            ColorMode::Other(_) => None,
        }
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorMode::Mono => write!(f, "mono"),
            ColorMode::Gray8 => write!(f, "gray8"),
            ColorMode::Rgb24 => write!(f, "rgb24"),
            ColorMode::Rgba32 => write!(f, "rgba32"),
            ColorMode::Other(color) => write!(f, "{}", format!("{color:?}").to_lowercase()),
        }
    }
}

/// Largest accepted copy count. Each copy is a full image write, so counts
/// beyond this are rejected before any planning happens.
pub const MAX_COPIES: u32 = 10_000;

/// Parameters shared by every image in one stack conversion.
///
/// Values are kept as supplied; each one is validated by the transform step
/// (or, for `copies`, the stack convertor) that consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSpec {
    /// Target width in pixels
    pub width: Option<i64>,

    /// Target height in pixels
    pub height: Option<i64>,

    /// Target depth code (1, 8, 24 or 32)
    pub bit_depth: Option<i64>,

    /// Prefix for generated layer names; `None` keeps original names
    pub name_format: Option<String>,

    /// Output extension including its separator (e.g. ".tif"); `None` keeps the original
    pub extension: Option<String>,

    /// Number of outputs per source file
    pub copies: i64,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            bit_depth: None,
            name_format: None,
            extension: None,
            copies: 1,
        }
    }
}

impl TransformSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: i64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: i64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn bit_depth(mut self, depth: i64) -> Self {
        self.bit_depth = Some(depth);
        self
    }

    pub fn name_format(mut self, format: impl Into<String>) -> Self {
        self.name_format = Some(format.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn copies(mut self, copies: i64) -> Self {
        self.copies = copies;
        self
    }

    /// Whether a resize step runs for each image.
    pub fn resizes(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Fill every unset field from `base`.
    ///
    /// Used to layer explicit parameters over a preset. `copies` always comes
    /// from `self`.
    pub fn or(self, base: &TransformSpec) -> Self {
        Self {
            width: self.width.or(base.width),
            height: self.height.or(base.height),
            bit_depth: self.bit_depth.or(base.bit_depth),
            name_format: self.name_format.or_else(|| base.name_format.clone()),
            extension: self.extension.or_else(|| base.extension.clone()),
            copies: self.copies,
        }
    }
}

/// Check that a name can be used as an output file name.
pub fn validate_name(name: &str) -> TransformResult<()> {
    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if contains_separator(name) {
        Some("must not contain a path separator")
    } else if name.contains('\0') {
        Some("must not contain NUL")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(TransformError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Check that an extension can be appended to an output file name.
///
/// The extension is used verbatim, so an empty string is allowed.
pub fn validate_extension(extension: &str) -> TransformResult<()> {
    let reason = if contains_separator(extension) {
        Some("must not contain a path separator")
    } else if extension.contains('\0') {
        Some("must not contain NUL")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(TransformError::InvalidExtension {
            extension: extension.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn contains_separator(s: &str) -> bool {
    s.chars().any(std::path::is_separator)
}

/// Where one converted image lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Output directory (`<source dir's parent>/output`)
    pub directory: PathBuf,
    /// Base name without extension
    pub file_name: String,
    /// Extension including its separator, possibly empty
    pub extension: String,
}

impl OutputArtifact {
    /// Locate the output for a source file.
    pub fn for_source(source: &Path, file_name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            directory: output_dir_for(source),
            file_name: file_name.into(),
            extension: extension.into(),
        }
    }

    /// Full path of the output file.
    pub fn path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.file_name, self.extension))
    }
}

/// Output directory for a source file: two levels up, then `output`.
pub fn output_dir_for(source: &Path) -> PathBuf {
    let parent = source.parent().unwrap_or(Path::new(""));
    parent.parent().unwrap_or(parent).join(OUTPUT_DIR_NAME)
}

/// Base name of a file without its final extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Final extension of a file including its leading dot, or empty.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// One written layer, as reported by a stack run and recorded in manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerRecord {
    /// 1-based layer index within the run
    pub layer: u64,

    /// 0-based copy index for this source file
    pub copy: u32,

    /// Source image path
    pub source: PathBuf,

    /// Written output path
    pub output: PathBuf,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Output color mode ("mono", "gray8", "rgb24", "rgba32", ...)
    pub mode: String,

    /// Format the source was decoded as ("png", "jpeg", ...), sniffed from content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<String>,
}
