//! Layer planning: assigns every (file, copy) pair its layer index and target
//! before any image is touched.
//!
//! Files form the outer loop and copies the inner loop, so all copies of one
//! file get consecutive indices. Indices start at 1 and grow by one per output
//! whether or not a name format is in use.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::{file_extension, file_stem, layer_name, OutputArtifact, TransformSpec};

use super::discovery::DiscoveredFile;

/// One output the run will produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOutput {
    /// 1-based layer index
    pub layer: u64,

    /// Source image
    pub source: PathBuf,

    /// 0-based copy index for this source
    pub copy: u32,

    /// Generated name, if a name format is set (otherwise the source stem is kept)
    pub name: Option<String>,

    /// Path the output will be written to
    pub target: PathBuf,
}

/// The ordered list of outputs for one stack run.
#[derive(Debug, Clone, Default)]
pub struct LayerPlan {
    entries: Vec<PlannedOutput>,
    files: usize,
}

impl LayerPlan {
    /// Plan `copies` outputs for each file, in file order.
    pub fn build(files: &[DiscoveredFile], spec: &TransformSpec, copies: u32) -> Self {
        let mut entries = Vec::with_capacity(files.len() * copies as usize);
        let mut layer: u64 = 1;

        for file in files {
            let stem = file_stem(&file.path);
            let extension = spec
                .extension
                .clone()
                .unwrap_or_else(|| file_extension(&file.path));

            for copy in 0..copies {
                let name = spec
                    .name_format
                    .as_deref()
                    .map(|format| layer_name(format, layer));
                let target = OutputArtifact::for_source(
                    &file.path,
                    name.clone().unwrap_or_else(|| stem.clone()),
                    extension.clone(),
                )
                .path();

                entries.push(PlannedOutput {
                    layer,
                    source: file.path.clone(),
                    copy,
                    name,
                    target,
                });
                layer += 1;
            }
        }

        Self {
            entries,
            files: files.len(),
        }
    }

    /// Number of source files the plan was built from.
    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn entries(&self) -> &[PlannedOutput] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedOutput> {
        self.entries.iter()
    }

    /// Group entries that write the same target into lanes.
    ///
    /// Lanes are ordered by their first entry and keep plan order inside, so
    /// running each lane sequentially (and lanes side by side) leaves the same
    /// files on disk as running the whole plan in order.
    pub fn lanes(&self) -> Vec<Vec<&PlannedOutput>> {
        let mut lanes: Vec<Vec<&PlannedOutput>> = Vec::new();
        let mut by_target: HashMap<&PathBuf, usize> = HashMap::new();

        for entry in &self.entries {
            match by_target.get(&entry.target) {
                Some(&lane) => lanes[lane].push(entry),
                None => {
                    by_target.insert(&entry.target, lanes.len());
                    lanes.push(vec![entry]);
                }
            }
        }
        lanes
    }

    /// Targets written by more than one entry (later writes replace earlier ones).
    pub fn collisions(&self) -> Vec<&PathBuf> {
        self.lanes()
            .into_iter()
            .filter(|lane| lane.len() > 1)
            .map(|lane| &lane[0].target)
            .collect()
    }
}

impl<'a> IntoIterator for &'a LayerPlan {
    type Item = &'a PlannedOutput;
    type IntoIter = std::slice::Iter<'a, PlannedOutput>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
