//! Usage command implementation

use super::output;
use crate::MeasureLibrary;
use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;
use tabled::{Table, Tabled, settings::Style};

/// Configuration for usage command
pub struct UsageConfig {
    pub snapshot: PathBuf,
    pub component: Option<String>,
    pub json: bool,
    pub verbose: bool,
}

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Component")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Used By")]
    usage: usize,
    #[tabled(rename = "Measures")]
    measures: String,
}

/// Report per-component usage from a snapshot
pub async fn usage(config: UsageConfig) -> Result<()> {
    if config.verbose {
        eprintln!("Reading snapshot: {}", config.snapshot.display());
    }

    let library = MeasureLibrary::load_from(&config.snapshot)
        .with_context(|| format!("Failed to load snapshot: {}", config.snapshot.display()))?;

    if let Some(component_id) = &config.component {
        if library.component(component_id).is_none() {
            anyhow::bail!("component '{component_id}' not found in snapshot");
        }
    }

    let components: Vec<_> = library
        .components()
        .filter(|component| {
            config
                .component
                .as_deref()
                .is_none_or(|wanted| component.id == wanted)
        })
        .collect();

    if config.json {
        let entries: Vec<_> = components
            .iter()
            .map(|component| {
                json!({
                    "id": component.id,
                    "name": component.name,
                    "status": component.version.status,
                    "usageCount": component.usage.usage_count(),
                    "measureIds": component.usage.measure_ids,
                })
            })
            .collect();
        let content = output::format_json(&json!(entries), true)?;
        output::write_output(&content, None)?;
        return Ok(());
    }

    if components.is_empty() {
        println!("(no components in snapshot)");
        return Ok(());
    }

    let rows: Vec<UsageRow> = components
        .iter()
        .map(|component| {
            let measures: Vec<&str> = component
                .usage
                .measure_ids
                .iter()
                .map(String::as_str)
                .collect();
            UsageRow {
                id: component.id.clone(),
                name: component.name.clone(),
                status: component.version.status.to_string(),
                usage: component.usage.usage_count(),
                measures: measures.join(", "),
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::modern()).to_string();
    println!("{table}");

    if config.verbose {
        eprintln!(
            "{}",
            output::format_success(&format!("{} component(s) reported", components.len()))
        );
    }

    Ok(())
}
