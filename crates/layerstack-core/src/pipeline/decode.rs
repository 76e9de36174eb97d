//! Image decoding with content-based format detection.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::Path;

use crate::error::{TransformError, TransformResult};
use crate::types::ColorMode;

/// Decodes source images into in-memory rasters.
pub struct ImageDecoder;

/// Result of decoding an image.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format, if the codec recognized one
    pub format: Option<ImageFormat>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color layout of the decoded raster
    pub mode: ColorMode,
}

impl ImageDecoder {
    /// Decode the image at `path`.
    ///
    /// The format is sniffed from the file contents first and falls back to
    /// the extension. Every failure is reported as `TransformError::Decode`
    /// carrying the codec's own error.
    pub fn decode(path: &Path) -> TransformResult<DecodedImage> {
        let decode_err = |source: image::ImageError| TransformError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| decode_err(image::ImageError::IoError(e)))?;
        let format = reader.format();
        let image = reader.decode().map_err(decode_err)?;

        let (width, height) = image.dimensions();
        let mode = ColorMode::from_color_type(image.color());
        tracing::trace!(?path, ?format, width, height, %mode, "Decoded");

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            mode,
        })
    }

    /// Read only the dimensions from the image header.
    pub fn dimensions(path: &Path) -> TransformResult<(u32, u32)> {
        image::image_dimensions(path).map_err(|source| TransformError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}
