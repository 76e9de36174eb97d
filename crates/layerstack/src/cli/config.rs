//! The `layerstack config` command: inspect, create and check config files.

use clap::{Args, Subcommand};
use layerstack_core::Config;
use std::path::{Path, PathBuf};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the settings a conversion would use, and where they came from
    Show,

    /// Show config file path
    Path,

    /// Write a commented config file holding the defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,

        /// Write here instead of the default location
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Parse and validate a config file without running anything
    Check {
        /// File to check (default: the config file path)
        file: Option<PathBuf>,
    },
}

const HEADER: &str = "\
# layerstack configuration
#
# [processing]
#   parallel_workers  1 converts layers strictly in order; more runs
#                     independent outputs side by side (layer numbers
#                     never change)
#   order             \"native\" keeps the filesystem listing order,
#                     \"name\" sorts files by name before numbering
#   preview_formats   extensions shown by `layerstack list`; conversion
#                     ignores this list
#
# [transform]
#   resize_filter     nearest, triangle, catmull-rom, gaussian, lanczos3
#   mono_conversion   bit depth 1 uses \"dither\" (Floyd-Steinberg) or
#                     \"threshold\"; output is 8-bit gray holding 0 and 255
#   mono_threshold    cut-off (0-255) for mono_conversion = \"threshold\"
#
# [logging]
#   level             error, warn, info, debug, trace
#   format            \"pretty\" or \"json\"
";

/// Default settings as TOML, preceded by a comment block describing each key.
fn annotated_default() -> anyhow::Result<String> {
    Ok(format!("{HEADER}\n{}", Config::default().to_toml()?))
}

/// Write the annotated defaults to `path`, refusing to replace a file unless `force`.
fn init_at(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, annotated_default()?)?;
    Ok(())
}

/// One-line description of where the active settings come from.
fn source_note(path: &Path) -> String {
    if path.exists() {
        format!("# Loaded from {}", path.display())
    } else {
        format!("# Defaults (no config file at {})", path.display())
    }
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", source_note(&Config::default_path()));
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force, path } => {
            let path = path.unwrap_or_else(Config::default_path);
            init_at(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::Check { file } => {
            let path = file.unwrap_or_else(Config::default_path);
            let config = Config::load_from(&path)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
            println!(
                "{}: ok ({} worker(s), {:?} order, {:?} mono)",
                path.display(),
                config.processing.parallel_workers,
                config.processing.order,
                config.transform.mono_conversion
            );
        }
    }

    Ok(())
}
