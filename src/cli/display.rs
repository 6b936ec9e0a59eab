//! Terminal display helpers: run summary tables and the progress spinner.

use std::time::Duration;

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::CycleSummary;
use crate::domain::models::RunStats;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Two-column key/value table without borders.
pub fn key_value_table(rows: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for (key, value) in rows {
        table.add_row(vec![
            Cell::new(key.to_uppercase()).set_alignment(CellAlignment::Left),
            Cell::new(value),
        ]);
    }
    table
}

/// Run counters as display rows.
pub fn stats_rows(stats: &RunStats) -> Vec<(&'static str, String)> {
    vec![
        ("run id", stats.run_id.to_string()),
        ("cycles", stats.cycles.to_string()),
        ("samples", stats.samples.to_string()),
        ("advances", stats.advances.to_string()),
        ("stale streak", stats.stale_streak.to_string()),
        ("transient failures", stats.transient_failures.to_string()),
        ("writes", stats.writes.to_string()),
        ("dropped records", stats.dropped_records.to_string()),
        ("final pass changes", stats.final_pass_changes.to_string()),
        ("elapsed", format_elapsed(stats.elapsed_ms)),
    ]
}

pub fn format_elapsed(elapsed_ms: u64) -> String {
    let secs = elapsed_ms / 1000;
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}.{:03}s", secs, elapsed_ms % 1000)
    }
}

/// Spinner on stderr, ticking while the harvest runs.
pub fn harvest_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("starting harvest");
    spinner
}

pub fn cycle_message(summary: &CycleSummary, max_stale_streak: u32) -> String {
    format!(
        "cycle {} | {} records (+{} new, {} longer) | stale {}/{} | step {} x{}",
        summary.cycle,
        summary.total,
        summary.new,
        summary.updated,
        summary.stale_streak,
        max_stale_streak,
        summary.intensity.step,
        summary.intensity.repetitions
    )
}
