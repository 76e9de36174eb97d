//! Single-image transform chain: open, resize, convert depth, rename, re-extend, save.
//!
//! A `SourceFile` is an existing path. Decoding it yields a `Transformed`
//! value, and every step consumes that value and returns the next one, so no
//! state is shared between images and a failed step leaves nothing half-applied.
//! `TransformRequest` bundles the parameters for one output and runs the
//! steps in their fixed order.

use image::imageops::{self, BiLevel, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat};
use std::path::{Path, PathBuf};

use crate::config::{MonoConversion, TransformConfig};
use crate::error::{Axis, TransformError, TransformResult};
use crate::types::{
    file_extension, file_stem, validate_extension, validate_name, BitDepth, ColorMode, Dimension,
    OutputArtifact,
};

use super::decode::ImageDecoder;

/// An existing source image path with its original name parts.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    stem: String,
    extension: String,
}

impl SourceFile {
    /// Open a source path. Fails with `NotFound` if nothing exists there.
    ///
    /// Nothing is read yet; decoding is the separate [`SourceFile::decode`] step.
    pub fn open(path: impl Into<PathBuf>) -> TransformResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(TransformError::NotFound(path));
        }
        Ok(Self {
            stem: file_stem(&path),
            extension: file_extension(&path),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original base name without extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Original extension including its leading dot, or empty.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Decode the file into a working image named after the source.
    pub fn decode(self) -> TransformResult<Transformed> {
        let decoded = ImageDecoder::decode(&self.path)?;
        Ok(Transformed {
            name: self.stem.clone(),
            extension: self.extension.clone(),
            image: decoded.image,
            mode: decoded.mode,
            format: decoded.format,
            source: self,
        })
    }
}

/// A decoded image partway through the transform chain.
pub struct Transformed {
    source: SourceFile,
    image: DynamicImage,
    mode: ColorMode,
    format: Option<ImageFormat>,
    name: String,
    extension: String,
}

impl Transformed {
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Current working dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Current color mode.
    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Format the source was decoded from.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Output base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resize with the default filter. See [`Transformed::resize_with`].
    pub fn resize(self, width: Option<i64>, height: Option<i64>) -> TransformResult<Self> {
        self.resize_with(width, height, &TransformConfig::default())
    }

    /// Resize to `width` x `height`.
    ///
    /// An omitted side keeps its current size. Both omitted still resamples
    /// to the current size. Bilevel images always use nearest-neighbour so
    /// they stay black and white.
    pub fn resize_with(
        mut self,
        width: Option<i64>,
        height: Option<i64>,
        config: &TransformConfig,
    ) -> TransformResult<Self> {
        let (current_width, current_height) = self.dimensions();
        let width = match width {
            Some(w) => Dimension::new(Axis::Width, w)?.get(),
            None => current_width,
        };
        let height = match height {
            Some(h) => Dimension::new(Axis::Height, h)?.get(),
            None => current_height,
        };

        let filter = if self.mode == ColorMode::Mono {
            FilterType::Nearest
        } else {
            config.resize_filter.into()
        };

        tracing::debug!(
            path = ?self.source.path,
            from = ?(current_width, current_height),
            to = ?(width, height),
            "Resize"
        );
        self.image = self.image.resize_exact(width, height, filter);
        Ok(self)
    }

    /// Convert depth with the default 1-bit strategy. See [`Transformed::convert_depth_with`].
    pub fn convert_depth(self, depth: Option<i64>) -> TransformResult<Self> {
        self.convert_depth_with(depth, &TransformConfig::default())
    }

    /// Convert to the color mode for `depth` (1, 8, 24 or 32).
    ///
    /// `None` keeps the current mode.
    pub fn convert_depth_with(
        mut self,
        depth: Option<i64>,
        config: &TransformConfig,
    ) -> TransformResult<Self> {
        let Some(depth) = depth else {
            tracing::trace!(path = ?self.source.path, mode = %self.mode, "Depth unchanged");
            return Ok(self);
        };
        let depth = BitDepth::try_from(depth)?;

        self.image = match depth {
            BitDepth::Mono => {
                DynamicImage::ImageLuma8(to_bilevel(self.image.to_luma8(), config))
            }
            BitDepth::Gray => DynamicImage::ImageLuma8(self.image.to_luma8()),
            BitDepth::Rgb => DynamicImage::ImageRgb8(self.image.to_rgb8()),
            BitDepth::Rgba => DynamicImage::ImageRgba8(self.image.to_rgba8()),
        };
        tracing::debug!(path = ?self.source.path, from = %self.mode, to = %depth.color_mode(), "Convert depth");
        self.mode = depth.color_mode();
        Ok(self)
    }

    /// Set the output base name; `None` restores the source's own name.
    pub fn rename(mut self, name: Option<&str>) -> TransformResult<Self> {
        match name {
            Some(name) => {
                validate_name(name)?;
                self.name = name.to_string();
            }
            None => self.name = self.source.stem.clone(),
        }
        Ok(self)
    }

    /// Set the output extension; `None` restores the source's own extension.
    ///
    /// The value is used verbatim, including its separator.
    pub fn with_extension(mut self, extension: Option<&str>) -> TransformResult<Self> {
        match extension {
            Some(extension) => {
                validate_extension(extension)?;
                self.extension = extension.to_string();
            }
            None => self.extension = self.source.extension.clone(),
        }
        Ok(self)
    }

    /// Where [`Transformed::save`] will write.
    pub fn artifact(&self) -> OutputArtifact {
        OutputArtifact::for_source(&self.source.path, &self.name, &self.extension)
    }

    /// Write the image to `<source dir's parent>/output/<name><extension>`.
    ///
    /// Creates the output directory if needed and overwrites an existing
    /// file. The encoder is chosen from the extension.
    pub fn save(self) -> TransformResult<OutputArtifact> {
        let artifact = self.artifact();
        std::fs::create_dir_all(&artifact.directory).map_err(|source| TransformError::Io {
            path: artifact.directory.clone(),
            source,
        })?;

        let target = artifact.path();
        self.image
            .save(&target)
            .map_err(|source| TransformError::Encode {
                path: target.clone(),
                source,
            })?;
        tracing::debug!(source = ?self.source.path, target = ?target, "Saved");
        Ok(artifact)
    }
}

/// Reduce grayscale to pure black and white.
fn to_bilevel(mut gray: GrayImage, config: &TransformConfig) -> GrayImage {
    match config.mono_conversion {
        MonoConversion::Dither => imageops::dither(&mut gray, &BiLevel),
        MonoConversion::Threshold => {
            let threshold = config.mono_threshold;
            for pixel in gray.pixels_mut() {
                pixel.0[0] = if pixel.0[0] >= threshold { 255 } else { 0 };
            }
        }
    }
    gray
}

/// Parameters for producing one output from one source file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformRequest<'a> {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub bit_depth: Option<i64>,
    pub name: Option<&'a str>,
    pub extension: Option<&'a str>,
}

/// What a completed request wrote.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub artifact: OutputArtifact,
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    pub source_format: Option<ImageFormat>,
}

impl TransformRequest<'_> {
    /// Run the full chain on `path`: open, decode, resize (only if a side was
    /// given), convert depth (only if a depth was given), rename, re-extend, save.
    pub fn apply(&self, path: &Path, config: &TransformConfig) -> TransformResult<TransformOutcome> {
        let mut image = SourceFile::open(path)?.decode()?;
        if self.width.is_some() || self.height.is_some() {
            image = image.resize_with(self.width, self.height, config)?;
        }
        if self.bit_depth.is_some() {
            image = image.convert_depth_with(self.bit_depth, config)?;
        }
        let image = image.rename(self.name)?.with_extension(self.extension)?;

        let (width, height) = image.dimensions();
        let mode = image.mode();
        let source_format = image.source_format();
        let artifact = image.save()?;
        Ok(TransformOutcome {
            artifact,
            width,
            height,
            mode,
            source_format,
        })
    }
}
