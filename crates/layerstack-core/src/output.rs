//! Machine-readable run output: layer plans and run manifests as JSON or JSONL.

use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::pipeline::RunSummary;
use crate::types::{LayerRecord, TransformSpec};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// Pick a format from a file extension, defaulting to JSON.
    pub fn for_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
            .unwrap_or(Self::Json)
    }
}

/// Everything a finished run wrote, for downstream tooling.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub version: &'static str,
    pub source: PathBuf,
    pub spec: TransformSpec,
    pub files: usize,
    pub copies: u32,
    pub elapsed_ms: u128,
    pub layers: Vec<LayerRecord>,
}

impl Manifest {
    pub fn new(source: &Path, spec: &TransformSpec, summary: &RunSummary) -> Self {
        Self {
            version: crate::VERSION,
            source: source.to_path_buf(),
            spec: spec.clone(),
            files: summary.files,
            copies: summary.copies,
            elapsed_ms: summary.elapsed.as_millis(),
            layers: summary.layers.clone(),
        }
    }

    /// Write the manifest. JSONL emits one layer record per line.
    pub fn write_to<W: Write>(&self, writer: &mut OutputWriter<W>) -> io::Result<()> {
        match writer.format() {
            OutputFormat::Json => writer.write(self),
            OutputFormat::JsonLines => writer.write_all(&self.layers),
        }
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer. `pretty` only affects JSON.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a single item followed by a newline.
    pub fn write<T: Serialize + ?Sized>(&mut self, item: &T) -> io::Result<()> {
        self.write_value(item)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write multiple items: a JSON array, or one line per item for JSONL.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                self.write_value(items)?;
                self.items_written += items.len();
            }
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(layer: u64) -> LayerRecord {
        LayerRecord {
            layer,
            copy: 0,
            source: PathBuf::from("/jobs/stack/a.png"),
            output: PathBuf::from(format!("/jobs/output/Layer_{layer:05}.tif")),
            width: 40,
            height: 50,
            mode: "mono".to_string(),
            source_format: Some("png".to_string()),
        }
    }

    fn summary() -> RunSummary {
        RunSummary {
            files: 1,
            copies: 2,
            layers: vec![record(1), record(2)],
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write(&record(7)).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\"layer\":7"));
        assert!(output.contains("\"mode\":\"mono\""));
    }

    #[test]
    fn test_write_all_json_array() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, true);
        writer.write_all(&[record(1), record(2)]).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with('['));
        assert!(output.trim().ends_with(']'));
    }

    #[test]
    fn test_empty_json_array_counts_nothing() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write_all::<LayerRecord>(&[]).unwrap();
        assert_eq!(writer.items_written(), 0);
        assert_eq!(String::from_utf8(buffer).unwrap().trim(), "[]");
    }

    #[test]
    fn test_manifest_jsonl_is_one_layer_per_line() {
        let spec = TransformSpec::new().name_format("Layer").copies(2);
        let manifest = Manifest::new(Path::new("/jobs/stack"), &spec, &summary());

        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, true);
        manifest.write_to(&mut writer).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["layer"], 1);
        assert_eq!(first["source_format"], "png");
    }

    #[test]
    fn test_manifest_json_document() {
        let spec = TransformSpec::new().bit_depth(1);
        let manifest = Manifest::new(Path::new("/jobs/stack"), &spec, &summary());

        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        manifest.write_to(&mut writer).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["files"], 1);
        assert_eq!(value["copies"], 2);
        assert_eq!(value["spec"]["bit_depth"], 1);
        assert_eq!(value["layers"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("invalid"), None);
        assert_eq!(
            OutputFormat::for_path(Path::new("run.ndjson")),
            OutputFormat::JsonLines
        );
        assert_eq!(OutputFormat::for_path(Path::new("run")), OutputFormat::Json);
    }
}
