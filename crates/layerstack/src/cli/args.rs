//! Stack arguments shared by `convert` and `plan`.

use anyhow::Context;
use clap::{Args, ValueEnum};
use layerstack_core::config::StackOrder;
use layerstack_core::{Axis, BitDepth, Config, Dimension, Preset, StackConvertor, TransformSpec};
use std::path::PathBuf;

/// File enumeration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// Filesystem order
    Native,
    /// Sorted by file name
    Name,
}

impl From<OrderArg> for StackOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Native => StackOrder::Native,
            OrderArg::Name => StackOrder::Name,
        }
    }
}

/// Which stack to convert and how.
#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// Directory holding the image stack
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Printer preset (xaar-xpm, meteor-hdc); explicit flags override it
    #[arg(long)]
    pub preset: Option<Preset>,

    /// Prefix for numbered layer names (e.g. "Layer" gives Layer_00001)
    #[arg(short, long)]
    pub name_format: Option<String>,

    /// Output extension, used verbatim (e.g. ".tif")
    #[arg(short, long, allow_hyphen_values = true)]
    pub extension: Option<String>,

    /// Output width in pixels
    #[arg(long, allow_negative_numbers = true)]
    pub width: Option<String>,

    /// Output height in pixels
    #[arg(long, allow_negative_numbers = true)]
    pub height: Option<String>,

    /// Output bit depth: 1, 8, 24 or 32
    #[arg(short, long)]
    pub bit_depth: Option<String>,

    /// Outputs per source file
    #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
    pub copies: i64,

    /// Number of parallel workers (overrides config)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// File enumeration order (overrides config)
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,
}

/// Values match the clap defaults above.
impl Default for StackArgs {
    fn default() -> Self {
        Self {
            dir: PathBuf::new(),
            preset: None,
            name_format: None,
            extension: None,
            width: None,
            height: None,
            bit_depth: None,
            copies: 1,
            parallel: None,
            order: None,
        }
    }
}

impl StackArgs {
    /// Build the transform spec, layering explicit flags over the preset.
    ///
    /// Width, height and depth are parsed here so a typo fails before any
    /// file is touched.
    pub fn spec(&self) -> anyhow::Result<TransformSpec> {
        let mut spec = TransformSpec::new().copies(self.copies);

        if let Some(width) = &self.width {
            spec = spec.width(Dimension::parse(Axis::Width, width)?.get().into());
        }
        if let Some(height) = &self.height {
            spec = spec.height(Dimension::parse(Axis::Height, height)?.get().into());
        }
        if let Some(depth) = &self.bit_depth {
            spec = spec.bit_depth(depth.parse::<BitDepth>()?.into());
        }
        if let Some(format) = &self.name_format {
            spec = spec.name_format(format.clone());
        }
        if let Some(extension) = &self.extension {
            spec = spec.extension(extension.clone());
        }
        if let Some(preset) = self.preset {
            spec = spec.or(&preset.spec());
        }
        Ok(spec)
    }

    /// Apply the command-line overrides to the loaded config.
    pub fn config(&self, base: &Config) -> Config {
        let mut config = base.clone();
        if let Some(parallel) = self.parallel {
            config.processing.parallel_workers = parallel.max(1);
        }
        if let Some(order) = self.order {
            config.processing.order = order.into();
        }
        config
    }

    /// The stack directory with `~` expanded.
    pub fn dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir.to_string_lossy()).into_owned())
    }

    /// Build a convertor for this stack.
    pub fn convertor(&self, base: &Config) -> anyhow::Result<StackConvertor> {
        let spec = self.spec()?;
        let dir = self.dir();
        StackConvertor::with_config(&dir, spec, &self.config(base))
            .with_context(|| format!("Cannot convert stack at {}", dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerstack_core::TransformError;

    #[test]
    fn stack_args_default_copies_is_one() {
        let args = StackArgs::default();
        assert_eq!(args.copies, 1);
        assert!(args.preset.is_none());
        assert!(args.parallel.is_none());
    }

    #[test]
    fn spec_from_flags() {
        let args = StackArgs {
            name_format: Some("Layer".into()),
            extension: Some(".tiff".into()),
            width: Some("40".into()),
            height: Some("50".into()),
            bit_depth: Some("1".into()),
            copies: 3,
            ..StackArgs::default()
        };
        let spec = args.spec().unwrap();
        assert_eq!(
            spec,
            TransformSpec::new()
                .name_format("Layer")
                .extension(".tiff")
                .width(40)
                .height(50)
                .bit_depth(1)
                .copies(3)
        );
    }

    #[test]
    fn flags_override_preset() {
        let args = StackArgs {
            preset: Some(Preset::XaarXpm),
            bit_depth: Some("24".into()),
            ..StackArgs::default()
        };
        let spec = args.spec().unwrap();
        assert_eq!(spec.bit_depth, Some(24));
        assert_eq!(spec.extension.as_deref(), Some(".bmp"));
        assert_eq!(spec.name_format.as_deref(), Some("Layer"));
    }

    #[test]
    fn bad_width_is_rejected() {
        let args = StackArgs {
            width: Some("wide".into()),
            ..StackArgs::default()
        };
        let err = args.spec().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransformError>(),
            Some(TransformError::InvalidDimension { axis: Axis::Width, .. })
        ));
    }

    #[test]
    fn bad_depth_is_rejected() {
        let args = StackArgs {
            bit_depth: Some("16".into()),
            ..StackArgs::default()
        };
        let err = args.spec().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransformError>(),
            Some(TransformError::InvalidBitDepth(_))
        ));
    }

    #[test]
    fn config_overrides() {
        let args = StackArgs {
            parallel: Some(0),
            order: Some(OrderArg::Name),
            ..StackArgs::default()
        };
        let config = args.config(&Config::default());
        assert_eq!(config.processing.parallel_workers, 1);
        assert_eq!(config.processing.order, StackOrder::Name);
    }

    #[test]
    fn convertor_rejects_missing_dir() {
        let args = StackArgs {
            dir: PathBuf::from("/definitely/not/a/stack"),
            ..StackArgs::default()
        };
        let err = args.convertor(&Config::default()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<TransformError>(),
            Some(TransformError::NotFound(_))
        ));
    }
}
