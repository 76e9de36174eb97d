//! The `layerstack list` command: previewable stack images and their sizes.

use clap::Args;
use layerstack_core::pipeline::{PreviewEntry, StackDiscovery};
use layerstack_core::Config;
use std::io::{self, Write};
use std::path::PathBuf;

use super::args::OrderArg;

/// Arguments for the `list` command.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Directory holding the image stack
    #[arg(required = true)]
    pub dir: PathBuf,

    /// File enumeration order
    #[arg(long, value_enum, default_value = "name")]
    pub order: OrderArg,
}

/// Execute the list command.
pub async fn execute(args: ListArgs, config: &Config) -> anyhow::Result<()> {
    let dir = PathBuf::from(shellexpand::tilde(&args.dir.to_string_lossy()).into_owned());
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let mut processing = config.processing.clone();
    processing.order = args.order.into();
    let entries = StackDiscovery::new(processing).preview(&dir)?;

    let stdout = io::stdout();
    write_entries(&entries, stdout.lock())?;
    tracing::info!("{} previewable image(s) in {:?}", entries.len(), dir);
    Ok(())
}

fn write_entries<W: Write>(entries: &[PreviewEntry], mut out: W) -> io::Result<()> {
    for entry in entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(out, "{:<40} {:>6} x {:<6}", name, entry.width, entry.height)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_one_per_line() {
        let entries = vec![
            PreviewEntry {
                path: PathBuf::from("/jobs/stack/a.png"),
                width: 640,
                height: 480,
            },
            PreviewEntry {
                path: PathBuf::from("/jobs/stack/b.tif"),
                width: 12,
                height: 8,
            },
        ];
        let mut buffer = Vec::new();
        write_entries(&entries, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.png"));
        assert!(lines[0].contains("640 x 480"));
    }

    #[tokio::test]
    async fn list_rejects_missing_dir() {
        let args = ListArgs {
            dir: PathBuf::from("/definitely/not/a/stack"),
            order: OrderArg::Name,
        };
        assert!(execute(args, &Config::default()).await.is_err());
    }
}
