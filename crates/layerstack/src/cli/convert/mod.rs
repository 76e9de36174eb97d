//! The `layerstack convert` command.

mod progress;

use clap::Args;
use layerstack_core::{Config, Manifest, OutputFormat, OutputWriter, RunSummary, StackConvertor};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::args::StackArgs;
use progress::{create_progress_bar, print_summary};

/// Arguments for the `convert` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Write a manifest of the produced layers (.jsonl gives one record per line)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Hide the progress bar and summary
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the convert command.
pub async fn execute(args: ConvertArgs, config: &Config) -> anyhow::Result<()> {
    let convertor = args.stack.convertor(config)?;

    let plan = convertor.plan()?;
    if plan.is_empty() {
        tracing::warn!("No files found in {:?}", convertor.path());
        return Ok(());
    }
    tracing::info!(
        "Found {} layer(s) to write with {} worker(s)",
        plan.len(),
        convertor.workers()
    );

    let progress = create_progress_bar(plan.len() as u64, args.quiet);
    let bar = progress.clone();
    let result = convertor
        .run_plan(plan, move |record| {
            bar.inc(1);
            if let Some(name) = record.output.file_name() {
                bar.set_message(name.to_string_lossy().into_owned());
            }
        })
        .await;
    progress.finish_and_clear();

    let summary = result?;

    if let Some(path) = &args.manifest {
        let records = write_manifest(path, &convertor, &summary)?;
        tracing::info!("Manifest written to {:?} ({} records)", path, records);
    }

    if !args.quiet {
        print_summary(&summary);
    }
    Ok(())
}

/// Write the run manifest to `path`, returning the number of records written.
fn write_manifest(
    path: &Path,
    convertor: &StackConvertor,
    summary: &RunSummary,
) -> anyhow::Result<usize> {
    let file = File::create(path)?;
    let mut writer = OutputWriter::new(BufWriter::new(file), OutputFormat::for_path(path), true);
    Manifest::new(convertor.path(), convertor.spec(), summary).write_to(&mut writer)?;
    writer.flush()?;
    Ok(writer.items_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn stack(root: &std::path::Path, names: &[&str]) -> PathBuf {
        let dir = root.join("stack");
        std::fs::create_dir_all(&dir).unwrap();
        for name in names {
            RgbImage::from_pixel(20, 20, Rgb([90, 120, 200]))
                .save(dir.join(name))
                .unwrap();
        }
        dir
    }

    #[test]
    fn convert_args_default_has_no_manifest() {
        let args = ConvertArgs::default();
        assert!(args.manifest.is_none());
        assert!(!args.quiet);
        assert_eq!(args.stack.copies, 1);
    }

    #[tokio::test]
    async fn convert_writes_layers_and_manifest() {
        let root = tempfile::tempdir().unwrap();
        let dir = stack(root.path(), &["a.png", "b.png"]);
        let manifest = root.path().join("run.jsonl");

        let args = ConvertArgs {
            stack: StackArgs {
                dir,
                name_format: Some("Layer".into()),
                extension: Some(".bmp".into()),
                bit_depth: Some("8".into()),
                copies: 2,
                ..StackArgs::default()
            },
            manifest: Some(manifest.clone()),
            quiet: true,
        };
        execute(args, &Config::default()).await.unwrap();

        for i in 1..=4 {
            assert!(root.path().join(format!("output/Layer_{i:05}.bmp")).exists());
        }
        let lines = std::fs::read_to_string(&manifest).unwrap();
        assert_eq!(lines.lines().count(), 4);
        assert!(lines.contains("\"mode\":\"gray8\""));
    }

    #[tokio::test]
    async fn convert_empty_stack_is_ok() {
        let root = tempfile::tempdir().unwrap();
        let dir = stack(root.path(), &[]);
        let args = ConvertArgs {
            stack: StackArgs {
                dir,
                ..StackArgs::default()
            },
            quiet: true,
            ..ConvertArgs::default()
        };
        execute(args, &Config::default()).await.unwrap();
        assert!(!root.path().join("output").exists());
    }

    #[tokio::test]
    async fn manifest_record_count_matches_format() {
        let root = tempfile::tempdir().unwrap();
        let dir = stack(root.path(), &["a.png"]);
        let convertor = layerstack_core::StackConvertor::new(
            &dir,
            layerstack_core::TransformSpec::new().name_format("L").copies(3),
        )
        .unwrap();
        let summary = convertor.run().await.unwrap();

        let jsonl = root.path().join("run.jsonl");
        assert_eq!(write_manifest(&jsonl, &convertor, &summary).unwrap(), 3);

        let json = root.path().join("run.json");
        assert_eq!(write_manifest(&json, &convertor, &summary).unwrap(), 1);
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value["layers"][0]["source_format"], "png");
    }
}
