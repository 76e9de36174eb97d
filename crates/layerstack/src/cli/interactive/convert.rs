//! Guided conversion flow.
//!
//! Stack directory → preset → name style → extension → size → bit depth →
//! copies → confirmation → convert. Builds a `ConvertArgs` and delegates to
//! `cli::convert::execute()`.

use crate::cli::args::StackArgs;
use crate::cli::convert::ConvertArgs;
use console::Style;
use dialoguer::{Confirm, Input, Select};
use layerstack_core::pipeline::StackDiscovery;
use layerstack_core::{Axis, Config, Dimension, Preset, MAX_COPIES};
use std::path::PathBuf;

use super::theme::layerstack_theme;

const NAME_STYLES: &[&str] = &[
    "Layer_00001, Layer_00002, ...",
    "Slice_00001, Slice_00002, ...",
    "Keep original names",
];

const EXTENSIONS: &[&str] = &[".png", ".bmp", ".tif", "Keep original extension"];

const DEPTHS: &[&str] = &[
    "Keep original",
    "Black & white (depth code 1)",
    "8-bit grayscale",
    "24-bit colour",
    "32-bit colour + alpha",
];

fn name_style(choice: usize) -> Option<String> {
    match choice {
        0 => Some("Layer".to_string()),
        1 => Some("Slice".to_string()),
        _ => None,
    }
}

fn extension(choice: usize) -> Option<String> {
    EXTENSIONS
        .get(choice)
        .filter(|ext| ext.starts_with('.'))
        .map(|ext| ext.to_string())
}

fn bit_depth(choice: usize) -> Option<String> {
    match choice {
        1 => Some("1".to_string()),
        2 => Some("8".to_string()),
        3 => Some("24".to_string()),
        4 => Some("32".to_string()),
        _ => None,
    }
}

/// Prompt for a stack directory until an existing directory is given.
/// Returns `Ok(None)` on interrupt.
pub fn prompt_stack_dir() -> anyhow::Result<Option<PathBuf>> {
    let theme = layerstack_theme();
    loop {
        let Some(raw_path) = super::handle_interrupt(
            Input::<String>::with_theme(&theme)
                .with_prompt("Stack directory")
                .interact_text(),
        )?
        else {
            return Ok(None);
        };

        let path = PathBuf::from(shellexpand::tilde(&raw_path).into_owned());
        if path.is_dir() {
            return Ok(Some(path));
        }
        let warn = Style::new().for_stderr().yellow();
        eprintln!(
            "  {}",
            warn.apply_to(format!("Not a directory: {}", path.display()))
        );
    }
}

/// Prompt for an optional side length. Empty input keeps the original.
fn prompt_dimension(
    theme: &dialoguer::theme::ColorfulTheme,
    axis: Axis,
) -> anyhow::Result<Option<Option<String>>> {
    let Some(raw) = super::handle_interrupt(
        Input::<String>::with_theme(theme)
            .with_prompt(format!("Output {axis} in pixels (empty keeps original)"))
            .allow_empty(true)
            .validate_with(move |input: &String| -> Result<(), String> {
                if input.trim().is_empty() {
                    return Ok(());
                }
                Dimension::parse(axis, input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact_text(),
    )?
    else {
        return Ok(None);
    };
    let raw = raw.trim();
    Ok(Some((!raw.is_empty()).then(|| raw.to_string())))
}

/// Walk the user through one stack conversion.
pub async fn guided_convert(config: &Config) -> anyhow::Result<()> {
    let theme = layerstack_theme();

    // ── Step 1: Stack directory ─────────────────────────────────────────────

    let Some(dir) = prompt_stack_dir()? else {
        return Ok(());
    };
    let files = StackDiscovery::new(config.processing.clone()).discover(&dir)?;
    let dim = Style::new().for_stderr().dim();
    eprintln!(
        "  {}",
        dim.apply_to(format!(
            "Found {} file(s) ({:.1} MB)",
            files.len(),
            StackDiscovery::total_size(&files) as f64 / 1_000_000.0
        ))
    );
    if files.is_empty() {
        return Ok(());
    }

    // ── Step 2: Preset ──────────────────────────────────────────────────────

    let mut preset_items = vec!["None (choose each setting)"];
    preset_items.extend(Preset::ALL.iter().map(|p| p.label()));
    let Some(preset_choice) = Select::with_theme(&theme)
        .with_prompt("Printer preset")
        .items(&preset_items)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };
    let preset = preset_choice
        .checked_sub(1)
        .and_then(|i| Preset::ALL.get(i).copied());

    // ── Steps 3-4: Name style and extension (preset supplies both) ──────────

    let mut stack = StackArgs {
        dir,
        preset,
        ..StackArgs::default()
    };

    if preset.is_none() {
        let Some(choice) = Select::with_theme(&theme)
            .with_prompt("Layer names")
            .items(NAME_STYLES)
            .default(0)
            .interact_opt()?
        else {
            return Ok(());
        };
        stack.name_format = name_style(choice);

        let Some(choice) = Select::with_theme(&theme)
            .with_prompt("Output extension")
            .items(EXTENSIONS)
            .default(0)
            .interact_opt()?
        else {
            return Ok(());
        };
        stack.extension = extension(choice);
    }

    // ── Step 5: Size ────────────────────────────────────────────────────────

    let Some(width) = prompt_dimension(&theme, Axis::Width)? else {
        return Ok(());
    };
    let Some(height) = prompt_dimension(&theme, Axis::Height)? else {
        return Ok(());
    };
    stack.width = width;
    stack.height = height;

    // ── Step 6: Bit depth (preset supplies it) ──────────────────────────────

    if preset.is_none() {
        let Some(choice) = Select::with_theme(&theme)
            .with_prompt("Bit depth")
            .items(DEPTHS)
            .default(0)
            .interact_opt()?
        else {
            return Ok(());
        };
        stack.bit_depth = bit_depth(choice);
    }

    // ── Step 7: Copies ──────────────────────────────────────────────────────

    let Some(copies) = super::handle_interrupt(
        Input::<u32>::with_theme(&theme)
            .with_prompt("Copies per image")
            .default(1)
            .validate_with(|c: &u32| -> Result<(), String> {
                if (1..=MAX_COPIES).contains(c) {
                    Ok(())
                } else {
                    Err(format!("Copies must be from 1 to {MAX_COPIES}"))
                }
            })
            .interact_text(),
    )?
    else {
        return Ok(());
    };
    stack.copies = i64::from(copies);

    // ── Step 8: Confirmation ────────────────────────────────────────────────

    let spec = stack.spec()?;
    let layers = files.len() as u64 * u64::from(copies);
    let bold = Style::new().for_stderr().bold();
    eprintln!();
    eprintln!(
        "  {}",
        bold.apply_to(format!(
            "Ready to write {layers} layer(s) from {} file(s)",
            files.len()
        ))
    );
    let or_keep = |v: Option<String>| v.unwrap_or_else(|| "keep".to_string());
    eprintln!(
        "  {}",
        dim.apply_to(format!(
            "Names: {} | Extension: {} | Size: {} x {} | Depth: {}",
            or_keep(spec.name_format.clone()),
            or_keep(spec.extension.clone()),
            or_keep(spec.width.map(|w| w.to_string())),
            or_keep(spec.height.map(|h| h.to_string())),
            or_keep(spec.bit_depth.map(|d| d.to_string())),
        ))
    );
    eprintln!();

    let confirm = Confirm::with_theme(&theme)
        .with_prompt("Start conversion?")
        .default(true)
        .interact_opt()?;
    if !matches!(confirm, Some(true)) {
        return Ok(());
    }

    // ── Step 9: Delegate ────────────────────────────────────────────────────

    let args = ConvertArgs {
        stack,
        ..ConvertArgs::default()
    };
    if let Err(e) = crate::cli::convert::execute(args, config).await {
        let err = Style::new().for_stderr().red();
        eprintln!("  {} {e:#}", err.apply_to("✗"));
    }

    eprintln!();
    let post_choice = Select::with_theme(&theme)
        .with_prompt("What next?")
        .items(&["Convert another stack", "Back to main menu"])
        .default(0)
        .interact_opt()?;

    if matches!(post_choice, Some(0)) {
        Box::pin(guided_convert(config)).await?;
    }

    Ok(())
}
