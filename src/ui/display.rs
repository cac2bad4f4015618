//! Terminal output: report tables, recipe listings and status lines.

use std::path::Path;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::cipher::{RsaOaep, registry};
use crate::recipe::{Recipe, Step};
use crate::types::{BatchReport, ProcessorMode};

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(header.iter().copied());
    table
}

/// Formats bytes into a human-readable string.
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    const UNIT: u64 = 1024;

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= UNIT as f64 && unit_idx < UNITS.len() - 1 {
        size /= UNIT as f64;
        unit_idx += 1;
    }

    format!("{size:.1} {}", UNITS[unit_idx])
}

/// Per-file results of a batch, followed by a summary line.
pub fn show_report(mode: ProcessorMode, report: &BatchReport) {
    let mut results = table(&["File", "Status", "Output"]);

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(blob) => results.add_row(vec![outcome.name.clone(), style("ok").green().to_string(), blob.name.clone()]),
            Err(e) => results.add_row(vec![outcome.name.clone(), style("failed").red().to_string(), e.to_string()]),
        };
    }

    println!();
    println!("{results}");

    let summary = format!("{}: {} succeeded, {} failed", mode, report.succeeded(), report.failed());
    if report.has_failures() {
        println!("{} {}", style("✗").red(), style(summary).bold());
    } else {
        println!("{} {}", style("✓").green(), style(summary).bold());
    }
}

pub fn show_recipe(recipe: &Recipe) {
    println!("{} {}", style(recipe.name()).bold(), style(format!("v{}", recipe.version())).dim());

    let mut steps = table(&["#", "Type", "Algorithm", "Key type", "Key", "Complete"]);
    for (index, step) in recipe.steps().iter().enumerate() {
        let complete = if step.is_complete() { style("yes").green() } else { style("no").yellow() };
        steps.add_row(vec![
            (index + 1).to_string(),
            step.kind().to_string(),
            step.algorithm().unwrap_or("-").to_owned(),
            step.key_type().map_or_else(|| "-".to_owned(), |key_type| key_type.to_string()),
            key_summary(step),
            complete.to_string(),
        ]);
    }

    println!("{steps}");
    println!("{} of {} steps will run", recipe.complete_steps(), recipe.len());
}

/// Which key material a step carries, without revealing any of it.
fn key_summary(step: &Step) -> String {
    if let Some(file) = step.key_file() {
        return file.name().unwrap_or("key file").to_owned();
    }
    if step.passphrase().is_some() {
        return "passphrase".to_owned();
    }

    let halves = match (step.public_key().is_some(), step.private_key().is_some()) {
        (true, true) => "public+private",
        (true, false) => "public",
        (false, true) => "private",
        (false, false) => return "-".to_owned(),
    };

    let public = step.public_key().cloned().or_else(|| step.private_key().map(|key| key.to_public_key()));
    match public.map(|key| RsaOaep::fingerprint(&key)) {
        Some(Ok(fingerprint)) => format!("{halves} {}", &fingerprint[..16]),
        _ => halves.to_owned(),
    }
}

pub fn show_algorithms() {
    let mut algorithms = table(&["Type", "Id", "Algorithm", "Key sources"]);
    for entry in registry::entries() {
        algorithms.add_row(vec![entry.kind.to_string(), entry.id.to_owned(), entry.label.to_owned(), entry.key_sources.to_string()]);
    }

    println!("{algorithms}");
}

pub fn show_written(what: &str, path: &Path, size: u64) {
    println!("{} {}", style("✓").green(), style(format!("{what} written: {} ({})", path.display(), format_bytes(size))).bold());
}

pub fn show_fingerprint(fingerprint: &str) {
    println!("  {} {}", style("SHA-256 fingerprint:").dim(), fingerprint);
}

pub fn show_warning(message: &str) {
    println!("{} {}", style("!").yellow(), style(message).yellow());
}
