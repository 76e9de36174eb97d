//! Layerstack CLI - batch-convert image stacks into print-ready layer sets.
//!
//! Every file in a stack directory is resized, converted to the requested bit
//! depth, renamed and re-extended, then written (once per copy) to an
//! `output` directory next to the stack.
//!
//! # Usage
//!
//! ```bash
//! # Numbered black & white TIFF layers, three copies of each slice
//! layerstack convert ./stack --name-format Layer --extension .tif --bit-depth 1 --copies 3
//!
//! # Use a printer preset
//! layerstack convert ./stack --preset xaar-xpm --width 1000 --height 1000
//!
//! # See what would be written
//! layerstack plan ./stack --preset meteor-hdc --format json
//!
//! # Guided mode
//! layerstack
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;

mod cli;
mod logging;

/// Layerstack - batch-convert image stacks into print-ready layer sets.
#[derive(Parser, Debug)]
#[command(name = "layerstack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert every image in a stack directory
    Convert(cli::convert::ConvertArgs),

    /// Show the layers a conversion would write, without writing them
    Plan(cli::plan::PlanArgs),

    /// List the previewable images in a stack with their dimensions
    List(cli::list::ListArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match layerstack_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `layerstack config path`."
            );
            layerstack_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Layerstack v{}", layerstack_core::VERSION);

    match cli.command {
        Some(Commands::Convert(args)) => cli::convert::execute(args, &config).await,
        Some(Commands::Plan(args)) => cli::plan::execute(args, &config).await,
        Some(Commands::List(args)) => cli::list::execute(args, &config).await,
        Some(Commands::Config(args)) => cli::config::execute(args).await,
        None if std::io::stdin().is_terminal() && std::io::stderr().is_terminal() => {
            cli::interactive::run(&config).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
