//! Merge command implementation

use super::output;
use crate::MeasureLibrary;
use anyhow::{Context, Result};
use colored::*;
use octofhir_measure_engine::MergeOptions;
use std::path::PathBuf;

/// Configuration for merge command
pub struct MergeConfig {
    pub snapshot: PathBuf,
    pub ids: Vec<String>,
    pub name: String,
    pub description: Option<String>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

/// Merge components in a snapshot and write the updated snapshot
pub async fn merge(config: MergeConfig) -> Result<()> {
    if config.verbose {
        eprintln!("Reading snapshot: {}", config.snapshot.display());
        eprintln!("Merging: {}", config.ids.join(", "));
    }

    let mut library = MeasureLibrary::load_from(&config.snapshot)
        .with_context(|| format!("Failed to load snapshot: {}", config.snapshot.display()))?;

    let mut options = MergeOptions::new(&config.name);
    if let Some(description) = &config.description {
        options = options.with_description(description);
    }

    let report = library
        .merge_components(&config.ids, options)
        .context("Merge failed; the snapshot was left unchanged")?;

    let merged = library
        .component(&report.component_id)
        .context("merged component missing after merge")?;

    eprintln!(
        "{} '{}' ({})",
        "Merged into:".green().bold(),
        merged.name,
        report.component_id.cyan()
    );
    eprintln!("  distinct codes: {}", merged.distinct_code_count());
    eprintln!("  archived inputs: {}", report.archived.join(", "));
    eprintln!(
        "  rewrote {} element(s) across {} measure(s)",
        report.rewrite.elements_rewritten, report.rewrite.measures_updated
    );
    for finding in &report.findings {
        eprintln!("{}", output::format_warning(&finding.to_string()));
    }

    let content = library.snapshot().to_json()?;
    output::write_output(&content, config.output.as_deref())?;

    Ok(())
}
