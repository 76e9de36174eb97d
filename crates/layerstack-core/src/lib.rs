//! Layerstack Core - batch conversion of image stacks into printer layers.
//!
//! A stack is a directory of slice images. Every file in it goes through the
//! same transform chain and is written, once per copy, to an `output`
//! directory next to the stack:
//!
//! ```text
//! Open → Decode → Resize → Convert depth → Rename → Re-extend → Save
//! ```
//!
//! With a name format set, outputs are numbered `<format>_00001`,
//! `<format>_00002`, ... across the whole run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use layerstack_core::{StackConvertor, TransformSpec};
//!
//! #[tokio::main]
//! async fn main() -> layerstack_core::TransformResult<()> {
//!     let spec = TransformSpec::new()
//!         .name_format("Layer")
//!         .extension(".tif")
//!         .bit_depth(1)
//!         .copies(3);
//!     let summary = StackConvertor::new("./stack", spec)?.run().await?;
//!     println!("Wrote {} layers", summary.layers.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod preset;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{Axis, ConfigError, TransformError, TransformResult};
pub use output::{Manifest, OutputFormat, OutputWriter};
pub use pipeline::{LayerPlan, PlannedOutput, RunSummary, SourceFile, StackConvertor, Transformed};
pub use preset::Preset;
pub use types::{BitDepth, ColorMode, Dimension, LayerRecord, OutputArtifact, TransformSpec, MAX_COPIES};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config_is_sequential() {
        let config = Config::default();
        assert_eq!(config.processing.parallel_workers, 1);
    }
}
