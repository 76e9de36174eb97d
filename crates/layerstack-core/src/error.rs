//! Error types for the layerstack conversion pipeline.
//!
//! Validation errors are raised at the call that receives the offending
//! value: path and copy-count problems when a stack convertor is built,
//! dimension/depth/name/extension problems when the matching transform step
//! runs. Codec failures keep the underlying `image::ImageError` as their source.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Which side of the raster a dimension argument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Width => write!(f, "width"),
            Axis::Height => write!(f, "height"),
        }
    }
}

/// Errors raised while converting a single image or a whole stack.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Source file or directory does not exist
    #[error("The specified path does not exist: {0}")]
    NotFound(PathBuf),

    /// Stack source is a file, not a directory
    #[error("{0} is not a valid directory")]
    NotADirectory(PathBuf),

    /// Copy count is zero, negative, or above `MAX_COPIES`
    #[error("Copies must be an integer from 1 to {max} (got {0})", max = crate::types::MAX_COPIES)]
    InvalidCopies(i64),

    /// Width or height is not a positive integer
    #[error("The {axis} must be a positive non-zero integer (got {value:?})")]
    InvalidDimension { axis: Axis, value: String },

    /// Bit depth is not one of the recognized codes
    #[error("Invalid bit depth {0:?}: only 1 (B&W), 8 (grayscale), 24 (true colour) or 32 (true colour with transparency) is allowed")]
    InvalidBitDepth(String),

    /// Output name cannot be used as a file name
    #[error("Invalid file name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Output extension cannot be used as a file suffix
    #[error("Invalid file extension {extension:?}: {reason}")]
    InvalidExtension {
        extension: String,
        reason: &'static str,
    },

    /// The codec could not decode the source
    #[error("Decode error for {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The codec could not encode the output
    #[error("Encode error for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem failure while enumerating the stack or preparing output
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A parallel worker ended without reporting a result
    #[error("Worker for {path} failed: {message}")]
    Worker { path: PathBuf, message: String },
}

/// Convenience type alias for transform-specific results.
pub type TransformResult<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_error_names_axis() {
        let err = TransformError::InvalidDimension {
            axis: Axis::Height,
            value: "-5".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("height"));
        assert!(msg.contains("-5"));
    }

    #[test]
    fn test_copies_error_names_limit() {
        let msg = TransformError::InvalidCopies(0).to_string();
        assert!(msg.contains("got 0"));
        assert!(msg.contains(&crate::types::MAX_COPIES.to_string()));
    }
}
