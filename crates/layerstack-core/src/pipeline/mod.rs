//! Stack conversion pipeline components.
//!
//! - **decode**: Load and decode images, sniffing the format from content
//! - **transform**: The per-image chain (resize, depth, rename, re-extend, save)
//! - **discovery**: Find the files of a stack directory
//! - **plan**: Assign layer indices and output targets up front
//! - **stack**: Run a plan over a whole directory

pub mod decode;
pub mod discovery;
pub mod plan;
pub mod stack;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, PreviewEntry, StackDiscovery};
pub use plan::{LayerPlan, PlannedOutput};
pub use stack::{RunSummary, StackConvertor};
pub use transform::{SourceFile, TransformOutcome, TransformRequest, Transformed};
