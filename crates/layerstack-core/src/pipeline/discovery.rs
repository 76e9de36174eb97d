//! Stack discovery: the regular files directly inside a source directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{ProcessingConfig, StackOrder};
use crate::error::{TransformError, TransformResult};

use super::decode::ImageDecoder;

/// Discovers the files making up an image stack.
pub struct StackDiscovery {
    config: ProcessingConfig,
}

/// A regular file found in a stack directory.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// A previewable stack image with its header dimensions.
#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl StackDiscovery {
    /// Create a new discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List every regular file directly inside `dir`.
    ///
    /// Sub-directories are not descended into and non-file entries are
    /// skipped. Symlinks count when they resolve to a file. No extension
    /// filtering happens here. Ordering follows `processing.order`: the
    /// filesystem's own order, or sorted by file name.
    pub fn discover(&self, dir: &Path) -> TransformResult<Vec<DiscoveredFile>> {
        let mut walker = WalkDir::new(dir).min_depth(1).max_depth(1);
        if self.config.order == StackOrder::Name {
            walker = walker.sort_by_file_name();
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| TransformError::Io {
                path: e.path().unwrap_or(dir).to_path_buf(),
                source: e.into(),
            })?;
            let entry_path = entry.path();
            if !entry_path.is_file() {
                tracing::trace!("Skipping non-file entry {:?}", entry_path);
                continue;
            }
            let size = std::fs::metadata(entry_path)
                .map(|m| m.len())
                .unwrap_or_default();
            files.push(DiscoveredFile {
                path: entry_path.to_path_buf(),
                size,
            });
        }

        tracing::debug!("Discovered {} file(s) in {:?}", files.len(), dir);
        Ok(files)
    }

    /// List the stack files with a recognized preview extension, with their
    /// dimensions read from the image header.
    ///
    /// Files whose header cannot be read are logged and left out.
    pub fn preview(&self, dir: &Path) -> TransformResult<Vec<PreviewEntry>> {
        let mut entries = Vec::new();
        for file in self.discover(dir)? {
            if !self.is_previewable(&file.path) {
                continue;
            }
            match ImageDecoder::dimensions(&file.path) {
                Ok((width, height)) => entries.push(PreviewEntry {
                    path: file.path,
                    width,
                    height,
                }),
                Err(e) => tracing::warn!("Cannot preview {:?}: {}", file.path, e),
            }
        }
        Ok(entries)
    }

    /// Check if a file has a recognized preview extension.
    fn is_previewable(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .preview_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
