//! Progress bar and end-of-run summary for `convert`.

use indicatif::{ProgressBar, ProgressStyle};
use layerstack_core::RunSummary;

/// Create a progress bar sized to the layer plan. Hidden when `quiet`.
pub fn create_progress_bar(total: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    match ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("##-")),
        Err(e) => tracing::debug!("Falling back to default progress style: {e}"),
    }
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a run.
pub fn print_summary(summary: &RunSummary) {
    let elapsed = summary.elapsed.as_secs_f64();
    let rate = if elapsed > 0.0 {
        summary.layers.len() as f64 / elapsed
    } else {
        0.0
    };
    let output_dir = summary
        .layers
        .first()
        .and_then(|l| l.output.parent())
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Files:        {:>8}", summary.files);
    eprintln!("    Copies:       {:>8}", summary.copies);
    eprintln!("    Layers:       {:>8}", summary.layers.len());
    let overwritten = summary.layers.len() - summary.distinct_outputs();
    if overwritten > 0 {
        eprintln!("    Overwritten:  {:>8}", overwritten);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", elapsed);
    eprintln!("    Rate:         {:>7.1} layers/sec", rate);
    eprintln!("  ====================================");
    if !output_dir.is_empty() {
        eprintln!("    Output: {output_dir}");
    }
}
