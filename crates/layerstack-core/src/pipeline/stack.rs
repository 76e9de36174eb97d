//! Stack orchestration: applies one `TransformSpec` to every file in a stack.
//!
//! Layer numbers come from a `LayerPlan` built before any work starts, so they
//! never depend on completion order. With one worker the plan runs strictly
//! in order. With more, independent output lanes run concurrently on the
//! blocking pool, bounded by a semaphore.
//!
//! The first failure stops the run. Outputs already written stay on disk and
//! nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::config::{Config, ProcessingConfig, TransformConfig};
use crate::error::{TransformError, TransformResult};
use crate::types::{LayerRecord, TransformSpec, MAX_COPIES};

use super::discovery::{DiscoveredFile, StackDiscovery};
use super::plan::{LayerPlan, PlannedOutput};
use super::transform::TransformRequest;

/// Converts a directory of images into a numbered output stack.
pub struct StackConvertor {
    path: PathBuf,
    spec: Arc<TransformSpec>,
    copies: u32,
    processing: ProcessingConfig,
    transform: TransformConfig,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Source files converted
    pub files: usize,
    /// Copies per source file
    pub copies: u32,
    /// Written layers, in layer order
    pub layers: Vec<LayerRecord>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Distinct output files left on disk (colliding layers count once).
    pub fn distinct_outputs(&self) -> usize {
        let mut outputs: Vec<&Path> = self.layers.iter().map(|l| l.output.as_path()).collect();
        outputs.sort();
        outputs.dedup();
        outputs.len()
    }
}

impl StackConvertor {
    /// Create a convertor with default configuration.
    pub fn new(path: impl Into<PathBuf>, spec: TransformSpec) -> TransformResult<Self> {
        Self::with_config(path, spec, &Config::default())
    }

    /// Create a convertor for the stack at `path`.
    ///
    /// Fails with `NotFound` if the path does not exist, `NotADirectory` if
    /// it is not a directory, and `InvalidCopies` unless `spec.copies` is in
    /// `1..=MAX_COPIES`. Transform parameters are checked later, when each
    /// image reaches the step that uses them.
    pub fn with_config(
        path: impl Into<PathBuf>,
        spec: TransformSpec,
        config: &Config,
    ) -> TransformResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(TransformError::NotFound(path));
        }
        if !path.is_dir() {
            return Err(TransformError::NotADirectory(path));
        }
        let copies = u32::try_from(spec.copies)
            .ok()
            .filter(|c| (1..=MAX_COPIES).contains(c))
            .ok_or(TransformError::InvalidCopies(spec.copies))?;

        Ok(Self {
            path,
            spec: Arc::new(spec),
            copies,
            processing: config.processing.clone(),
            transform: config.transform.clone(),
        })
    }

    /// Override the number of parallel workers (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.processing.parallel_workers = workers.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    pub fn workers(&self) -> usize {
        self.processing.parallel_workers.max(1)
    }

    /// List the stack's files in processing order.
    pub fn discover(&self) -> TransformResult<Vec<DiscoveredFile>> {
        StackDiscovery::new(self.processing.clone()).discover(&self.path)
    }

    /// Compute the layer plan without writing anything.
    pub fn plan(&self) -> TransformResult<LayerPlan> {
        let files = self.discover()?;
        Ok(LayerPlan::build(&files, &self.spec, self.copies))
    }

    /// Convert the whole stack.
    pub async fn run(&self) -> TransformResult<RunSummary> {
        self.run_with(|_| {}).await
    }

    /// Convert the whole stack, calling `on_layer` after each layer is written.
    pub async fn run_with<F>(&self, on_layer: F) -> TransformResult<RunSummary>
    where
        F: Fn(&LayerRecord) + Send + Sync + 'static,
    {
        let plan = self.plan()?;
        self.run_plan(plan, on_layer).await
    }

    /// Convert exactly the entries of a plan built earlier by [`plan`](Self::plan).
    ///
    /// The stack is not listed again, so files added or removed after
    /// planning do not change what gets written.
    pub async fn run_plan<F>(&self, plan: LayerPlan, on_layer: F) -> TransformResult<RunSummary>
    where
        F: Fn(&LayerRecord) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let files = plan.file_count();

        if plan.is_empty() {
            tracing::warn!("No files found in {:?}", self.path);
            return Ok(self.summary(files, Vec::new(), start));
        }
        for target in plan.collisions() {
            tracing::warn!("Several layers write {:?}; only the last one is kept", target);
        }
        tracing::info!(
            "Converting {} file(s) x {} cop{} into {} layer(s)",
            files,
            self.copies,
            if self.copies == 1 { "y" } else { "ies" },
            plan.len()
        );

        let on_layer = Arc::new(on_layer);
        let layers = if self.workers() == 1 {
            self.run_sequential(plan, on_layer).await?
        } else {
            self.run_parallel(plan, on_layer).await?
        };

        let summary = self.summary(files, layers, start);
        tracing::info!(
            "Wrote {} layer(s) in {:.2?}",
            summary.layers.len(),
            summary.elapsed
        );
        Ok(summary)
    }

    fn summary(&self, files: usize, layers: Vec<LayerRecord>, start: Instant) -> RunSummary {
        RunSummary {
            files,
            copies: self.copies,
            layers,
            elapsed: start.elapsed(),
        }
    }

    /// Run every entry in plan order on one blocking thread.
    async fn run_sequential<F>(
        &self,
        plan: LayerPlan,
        on_layer: Arc<F>,
    ) -> TransformResult<Vec<LayerRecord>>
    where
        F: Fn(&LayerRecord) + Send + Sync + 'static,
    {
        let spec = self.spec.clone();
        let config = self.transform.clone();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let mut layers = Vec::with_capacity(plan.len());
            for entry in &plan {
                let record = convert_entry(entry, &spec, &config)?;
                on_layer(&record);
                layers.push(record);
            }
            Ok::<_, TransformError>(layers)
        })
        .await
        .map_err(|e| TransformError::Worker {
            path,
            message: format!("Task join error: {e}"),
        })?
    }

    /// Run output lanes concurrently, each lane in plan order.
    async fn run_parallel<F>(
        &self,
        plan: LayerPlan,
        on_layer: Arc<F>,
    ) -> TransformResult<Vec<LayerRecord>>
    where
        F: Fn(&LayerRecord) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers()));
        let failed = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();

        for lane in plan.lanes() {
            let lane: Vec<PlannedOutput> = lane.into_iter().cloned().collect();
            let first = lane[0].clone();

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| TransformError::Worker {
                    path: first.source.clone(),
                    message: format!("Worker pool closed: {e}"),
                })?;
            if failed.load(Ordering::SeqCst) {
                tracing::debug!("Stopping dispatch after a failed layer");
                break;
            }

            let spec = self.spec.clone();
            let config = self.transform.clone();
            let failed = failed.clone();
            let on_layer = on_layer.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let mut layers = Vec::with_capacity(lane.len());
                for entry in &lane {
                    match convert_entry(entry, &spec, &config) {
                        Ok(record) => {
                            on_layer(&record);
                            layers.push(record);
                        }
                        Err(e) => {
                            failed.store(true, Ordering::SeqCst);
                            return (layers, Some((entry.layer, e)));
                        }
                    }
                }
                (layers, None)
            });
            handles.push((first, handle));
        }

        let mut layers = Vec::with_capacity(plan.len());
        let mut first_error: Option<(u64, TransformError)> = None;
        let mut keep_earliest = |layer: u64, error: TransformError| {
            if first_error.as_ref().map_or(true, |(l, _)| layer < *l) {
                first_error = Some((layer, error));
            }
        };

        for (first, handle) in handles {
            match handle.await {
                Ok((done, error)) => {
                    layers.extend(done);
                    if let Some((layer, e)) = error {
                        keep_earliest(layer, e);
                    }
                }
                Err(e) => {
                    tracing::error!("Layer task for {:?} panicked: {e}", first.source);
                    keep_earliest(
                        first.layer,
                        TransformError::Worker {
                            path: first.source,
                            message: format!("Task join error: {e}"),
                        },
                    );
                }
            }
        }

        if let Some((layer, e)) = first_error {
            tracing::error!("Layer {layer} failed: {e}");
            return Err(e);
        }
        layers.sort_by_key(|l| l.layer);
        Ok(layers)
    }
}

/// Produce one planned layer.
fn convert_entry(
    entry: &PlannedOutput,
    spec: &TransformSpec,
    config: &TransformConfig,
) -> TransformResult<LayerRecord> {
    let start = Instant::now();
    let request = TransformRequest {
        width: spec.width,
        height: spec.height,
        bit_depth: spec.bit_depth,
        name: entry.name.as_deref(),
        extension: spec.extension.as_deref(),
    };
    let outcome = request.apply(&entry.source, config)?;
    tracing::trace!("  Layer {}: {:?}", entry.layer, start.elapsed());

    Ok(LayerRecord {
        layer: entry.layer,
        copy: entry.copy,
        source: entry.source.clone(),
        output: outcome.artifact.path(),
        width: outcome.width,
        height: outcome.height,
        mode: outcome.mode.to_string(),
        source_format: outcome
            .source_format
            .map(|format| format!("{format:?}").to_lowercase()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackOrder;
    use crate::pipeline::test_support::{is_bilevel, stack_dir, write_image};
    use std::sync::atomic::AtomicUsize;

    fn name_ordered() -> Config {
        let mut config = Config::default();
        config.processing.order = StackOrder::Name;
        config
    }

    fn output_names(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(root.join("output"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_new_missing_path() {
        let err = StackConvertor::new("nonexistent_path", TransformSpec::new()).err().unwrap();
        assert!(matches!(err, TransformError::NotFound(_)));
    }

    #[test]
    fn test_new_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["a.png"], 4, 4);
        let err = StackConvertor::new(stack.join("a.png"), TransformSpec::new())
            .err()
            .unwrap();
        assert!(matches!(err, TransformError::NotADirectory(_)));
    }

    #[test]
    fn test_new_rejects_bad_copies() {
        let dir = tempfile::tempdir().unwrap();
        let too_many = i64::from(MAX_COPIES) + 1;
        for copies in [0, -1, too_many, i64::from(u32::MAX)] {
            let err = StackConvertor::new(dir.path(), TransformSpec::new().copies(copies))
                .err()
                .unwrap();
            assert!(matches!(err, TransformError::InvalidCopies(c) if c == copies));
        }
    }

    #[test]
    fn test_new_accepts_copy_limit() {
        let dir = tempfile::tempdir().unwrap();
        let spec = TransformSpec::new().copies(i64::from(MAX_COPIES));
        let convertor = StackConvertor::new(dir.path(), spec).unwrap();
        assert_eq!(convertor.copies(), MAX_COPIES);
    }

    #[test]
    fn test_new_accepts_valid_stack() {
        let dir = tempfile::tempdir().unwrap();
        let convertor =
            StackConvertor::new(dir.path(), TransformSpec::new().name_format("Layer")).unwrap();
        assert_eq!(convertor.path(), dir.path());
        assert_eq!(convertor.copies(), 1);
        assert_eq!(convertor.workers(), 1);
    }

    #[tokio::test]
    async fn test_single_file_three_copies() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["test_image.jpg"], 100, 100);
        let spec = TransformSpec::new()
            .name_format("Layer")
            .extension(".tiff")
            .width(40)
            .height(50)
            .bit_depth(1)
            .copies(3);

        let summary = StackConvertor::new(&stack, spec).unwrap().run().await.unwrap();
        assert_eq!(summary.layers.len(), 3);
        assert_eq!(
            output_names(dir.path()),
            vec!["Layer_00001.tiff", "Layer_00002.tiff", "Layer_00003.tiff"]
        );
        for record in &summary.layers {
            assert_eq!((record.width, record.height), (40, 50));
            assert_eq!(record.mode, "mono");
            assert_eq!(record.source_format.as_deref(), Some("jpeg"));
            let written = image::open(&record.output).unwrap();
            assert_eq!((written.width(), written.height()), (40, 50));
            assert_eq!(written.color(), image::ColorType::L8);
            assert!(is_bilevel(&written.to_luma8()));
        }
    }

    #[tokio::test]
    async fn test_every_layer_index_used_once() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["a.png", "b.png", "c.png"], 8, 8);
        let spec = TransformSpec::new().name_format("Slice").copies(2);

        let summary = StackConvertor::with_config(&stack, spec, &name_ordered())
            .unwrap()
            .run()
            .await
            .unwrap();

        let layers: Vec<u64> = summary.layers.iter().map(|l| l.layer).collect();
        assert_eq!(layers, (1..=6).collect::<Vec<_>>());
        assert_eq!(summary.files, 3);
        assert_eq!(
            output_names(dir.path()),
            (1..=6).map(|i| format!("Slice_{i:05}.png")).collect::<Vec<_>>()
        );
        let sources: Vec<_> = summary
            .layers
            .iter()
            .map(|l| l.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(sources, vec!["a.png", "a.png", "b.png", "b.png", "c.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_original_names_overwrite_across_copies() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["slice.png"], 8, 8);
        let spec = TransformSpec::new().extension(".bmp").copies(3);

        let summary = StackConvertor::new(&stack, spec).unwrap().run().await.unwrap();
        assert_eq!(summary.layers.len(), 3);
        assert_eq!(summary.distinct_outputs(), 1);
        assert_eq!(output_names(dir.path()), vec!["slice.bmp"]);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential_numbering() {
        let names = ["a.png", "b.png", "c.png", "d.png", "e.png"];
        let spec = TransformSpec::new().name_format("Layer").width(6).copies(2);

        let seq_dir = tempfile::tempdir().unwrap();
        let seq_stack = stack_dir(seq_dir.path(), &names, 12, 12);
        let sequential = StackConvertor::with_config(&seq_stack, spec.clone(), &name_ordered())
            .unwrap()
            .run()
            .await
            .unwrap();

        let par_dir = tempfile::tempdir().unwrap();
        let par_stack = stack_dir(par_dir.path(), &names, 12, 12);
        let parallel = StackConvertor::with_config(&par_stack, spec, &name_ordered())
            .unwrap()
            .with_workers(4)
            .run()
            .await
            .unwrap();

        let key = |s: &RunSummary| -> Vec<(u64, String, String)> {
            s.layers
                .iter()
                .map(|l| {
                    (
                        l.layer,
                        l.source.file_name().unwrap().to_string_lossy().into_owned(),
                        l.output.file_name().unwrap().to_string_lossy().into_owned(),
                    )
                })
                .collect()
        };
        assert_eq!(key(&sequential), key(&parallel));
        assert_eq!(output_names(par_dir.path()).len(), 10);
    }

    #[tokio::test]
    async fn test_failure_aborts_and_keeps_earlier_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["a.png", "c.png"], 8, 8);
        std::fs::write(stack.join("b.txt"), "not an image").unwrap();
        let spec = TransformSpec::new().name_format("L");

        let err = StackConvertor::with_config(&stack, spec, &name_ordered())
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::Decode { ref path, .. } if path.ends_with("b.txt")));
        assert_eq!(output_names(dir.path()), vec!["L_00001.png"]);
    }

    #[tokio::test]
    async fn test_parallel_failure_reports_earliest_layer() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["a.png", "c.png"], 8, 8);
        std::fs::write(stack.join("b.txt"), "not an image").unwrap();
        std::fs::write(stack.join("d.txt"), "not an image either").unwrap();
        let spec = TransformSpec::new().name_format("L");

        let err = StackConvertor::with_config(&stack, spec, &name_ordered())
            .unwrap()
            .with_workers(3)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::Decode { ref path, .. } if path.ends_with("b.txt")));
    }

    #[tokio::test]
    async fn test_invalid_dimension_surfaces_at_run() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["a.png"], 8, 8);
        let convertor = StackConvertor::new(&stack, TransformSpec::new().width(-5)).unwrap();

        let err = convertor.run().await.unwrap_err();
        assert!(matches!(err, TransformError::InvalidDimension { .. }));
    }

    #[tokio::test]
    async fn test_empty_stack_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stack = dir.path().join("stack");
        std::fs::create_dir_all(&stack).unwrap();

        let summary = StackConvertor::new(&stack, TransformSpec::new())
            .unwrap()
            .run()
            .await
            .unwrap();
        assert!(summary.layers.is_empty());
        assert!(!dir.path().join("output").exists());
    }

    #[tokio::test]
    async fn test_callback_sees_every_layer() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["a.png", "b.png"], 8, 8);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        StackConvertor::new(&stack, TransformSpec::new().name_format("L").copies(2))
            .unwrap()
            .with_workers(2)
            .run_with(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_run_plan_ignores_files_added_after_planning() {
        let dir = tempfile::tempdir().unwrap();
        let stack = stack_dir(dir.path(), &["a.png", "b.png"], 8, 8);
        let convertor =
            StackConvertor::with_config(&stack, TransformSpec::new().name_format("L"), &name_ordered())
                .unwrap();

        let plan = convertor.plan().unwrap();
        assert_eq!(plan.file_count(), 2);
        write_image(&stack.join("c.png"), 8, 8);

        let summary = convertor.run_plan(plan, |_| {}).await.unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.layers.len(), 2);
        assert_eq!(output_names(dir.path()), vec!["L_00001.png", "L_00002.png"]);
    }
}
