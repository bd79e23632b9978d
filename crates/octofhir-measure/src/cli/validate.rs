//! Validate command implementation

use super::output;
use crate::MeasureLibrary;
use anyhow::{Context, Result};
use colored::*;
use octofhir_measure_diagnostics::{AuditFinding, Severity};
use std::path::PathBuf;

/// Configuration for validate command
pub struct ValidateConfig {
    pub snapshot: PathBuf,
    pub strict: bool,
    pub verbose: bool,
}

/// Audit a snapshot for referential integrity
pub async fn validate(config: ValidateConfig) -> Result<()> {
    if config.verbose {
        eprintln!("Auditing snapshot: {}", config.snapshot.display());
    }

    let library = MeasureLibrary::load_from(&config.snapshot)
        .with_context(|| format!("Failed to load snapshot: {}", config.snapshot.display()))?;

    if config.verbose {
        eprintln!(
            "Loaded {} component(s) and {} measure(s)",
            library.component_count(),
            library.measure_count()
        );
    }

    let findings = library.validate();
    print_audit_result(&config.snapshot, &findings);

    let errors = findings.iter().filter(|f| f.is_error()).count();
    let warnings = findings.len() - errors;

    println!();
    if findings.is_empty() {
        println!(
            "{}",
            output::format_success("Library and measures are consistent")
        );
        return Ok(());
    }

    let mut summary = Vec::new();
    if errors > 0 {
        summary.push(format!("{} error(s)", errors).red().to_string());
    }
    if warnings > 0 {
        summary.push(format!("{} warning(s)", warnings).yellow().to_string());
    }
    eprintln!(
        "{} Found {}",
        "Audit failed:".red().bold(),
        summary.join(", ")
    );

    if config.strict && warnings > 0 {
        eprintln!("{}", "Strict mode: treating warnings as errors".yellow());
        std::process::exit(1);
    }
    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Print the audit result for a snapshot
fn print_audit_result(snapshot: &PathBuf, findings: &[AuditFinding]) {
    let status = if findings.is_empty() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };

    println!("{} {}", status, snapshot.display().to_string().cyan());

    for finding in findings {
        print_finding(finding);
    }
}

/// Print a single finding
fn print_finding(finding: &AuditFinding) {
    let severity = match finding.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".normal(),
    };
    println!(
        "  {} {}: {}",
        finding.code.to_string().cyan(),
        severity,
        finding.message
    );
}
