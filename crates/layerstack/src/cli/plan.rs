//! The `layerstack plan` command: print the layer plan without writing files.

use clap::{Args, ValueEnum};
use layerstack_core::{Config, LayerPlan, OutputFormat, OutputWriter};
use std::io::{self, Write};

use super::args::StackArgs;

/// How to print the plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// Aligned columns
    #[default]
    Table,
    /// Single JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

/// Arguments for the `plan` command.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: PlanFormat,
}

/// Execute the plan command.
pub async fn execute(args: PlanArgs, config: &Config) -> anyhow::Result<()> {
    let convertor = args.stack.convertor(config)?;
    let plan = convertor.plan()?;

    for target in plan.collisions() {
        tracing::warn!("Several layers write {:?}; only the last one is kept", target);
    }

    let stdout = io::stdout();
    write_plan(&plan, args.format, stdout.lock())?;
    Ok(())
}

fn write_plan<W: Write>(plan: &LayerPlan, format: PlanFormat, mut out: W) -> io::Result<()> {
    match format {
        PlanFormat::Table => {
            writeln!(out, "{:>7}  {:>4}  {:<32}  TARGET", "LAYER", "COPY", "SOURCE")?;
            for entry in plan {
                let source = entry
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{:>7}  {:>4}  {:<32}  {}",
                    entry.layer,
                    entry.copy + 1,
                    source,
                    entry.target.display()
                )?;
            }
            out.flush()
        }
        PlanFormat::Json => {
            let mut writer = OutputWriter::new(out, OutputFormat::Json, true);
            writer.write_all(plan.entries())?;
            writer.flush()
        }
        PlanFormat::Jsonl => {
            let mut writer = OutputWriter::new(out, OutputFormat::JsonLines, false);
            writer.write_all(plan.entries())?;
            writer.flush()
        }
    }
}
