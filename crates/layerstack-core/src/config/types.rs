//! Sub-configuration structs with their defaults.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers (1 = strictly sequential)
    pub parallel_workers: usize,

    /// Order in which stack files are enumerated and numbered
    pub order: StackOrder,

    /// Extensions recognized when previewing a stack (not used to filter conversion)
    pub preview_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 1,
            order: StackOrder::Native,
            preview_formats: vec![
                "png".to_string(),
                "bmp".to_string(),
                "tif".to_string(),
                "tiff".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
            ],
        }
    }
}

/// Enumeration order for files in a stack directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackOrder {
    /// Whatever order the filesystem returns entries in
    #[default]
    Native,
    /// Lexicographic by file name
    Name,
}

/// Settings for the per-image transform steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Resampling filter used by resize
    pub resize_filter: ResizeFilter,

    /// How 1-bit conversion turns gray levels into black and white
    pub mono_conversion: MonoConversion,

    /// Cut-off used when `mono_conversion = "threshold"`
    pub mono_threshold: u8,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            resize_filter: ResizeFilter::CatmullRom,
            mono_conversion: MonoConversion::Dither,
            mono_threshold: 128,
        }
    }
}

/// Resampling filters offered by the codec library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Strategy for reducing grayscale to bilevel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonoConversion {
    /// Floyd-Steinberg error diffusion
    #[default]
    Dither,
    /// Fixed cut-off, no diffusion
    Threshold,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
