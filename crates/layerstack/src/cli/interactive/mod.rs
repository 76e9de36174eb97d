//! Interactive mode: a guided flow for bare `layerstack` on a terminal.
//!
//! Prompts build the same `ConvertArgs` the flag-based CLI takes and hand
//! them to `cli::convert::execute`.

pub mod convert;
pub mod theme;

use console::Style;
use dialoguer::Select;
use layerstack_core::pipeline::StackDiscovery;
use layerstack_core::Config;

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

const MENU_ITEMS: &[&str] = &["Convert a stack", "Preview a stack", "Show settings", "Exit"];

/// Entry point for interactive mode.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    theme::print_banner();
    let theme = theme::layerstack_theme();

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => convert::guided_convert(config).await?,
            Some(1) => preview_stack(config)?,
            Some(2) => show_config(config),
            _ => break, // Exit, Esc or Ctrl+C
        }
    }

    Ok(())
}

/// Ask for a stack directory and list its images with their sizes.
fn preview_stack(config: &Config) -> anyhow::Result<()> {
    let Some(dir) = convert::prompt_stack_dir()? else {
        return Ok(());
    };

    let entries = StackDiscovery::new(config.processing.clone()).preview(&dir)?;
    let dim = Style::new().for_stderr().dim();
    eprintln!();
    for entry in &entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        eprintln!("    {:<40} {}", name, dim.apply_to(format!("{} x {}", entry.width, entry.height)));
    }
    eprintln!();
    eprintln!("  {}", dim.apply_to(format!("{} previewable image(s)", entries.len())));
    eprintln!();
    Ok(())
}

/// Print a summary of the active settings.
fn show_config(config: &Config) {
    let dim = Style::new().for_stderr().dim();
    let cyan = Style::new().for_stderr().cyan();
    let label = Style::new().for_stderr().bold();

    let config_path = Config::default_path();
    let path_note = if config_path.exists() {
        "(exists)"
    } else {
        "(using defaults)"
    };

    eprintln!();
    eprintln!("  {}", cyan.apply_to("Current configuration:"));
    eprintln!();
    eprintln!(
        "    {:<20} {} {}",
        label.apply_to("Config file:"),
        config_path.display(),
        dim.apply_to(path_note)
    );
    eprintln!(
        "    {:<20} {} worker(s), {:?} order",
        label.apply_to("Processing:"),
        config.processing.parallel_workers,
        config.processing.order
    );
    eprintln!(
        "    {:<20} {:?} resize, {:?} mono",
        label.apply_to("Transform:"),
        config.transform.resize_filter,
        config.transform.mono_conversion
    );
    eprintln!(
        "    {:<20} {}",
        label.apply_to("Log level:"),
        config.logging.level
    );
    eprintln!();
}
