//! Measure library command-line interface

use clap::{Parser, Subcommand};
use octofhir_measure::cli::{merge, output, usage, validate};
use std::path::PathBuf;

/// Measure library tool
#[derive(Parser)]
#[command(name = "cqm")]
#[command(author, version, about = "Clinical quality measure library tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a snapshot for referential integrity
    Validate {
        /// Snapshot file to audit
        snapshot: PathBuf,

        /// Strict mode (warnings as errors)
        #[arg(short, long)]
        strict: bool,
    },

    /// Report per-component usage
    Usage {
        /// Snapshot file to read
        snapshot: PathBuf,

        /// Report a single component
        #[arg(short, long)]
        component: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Merge library components and rewrite measure references
    Merge {
        /// Snapshot file to read
        snapshot: PathBuf,

        /// Component ids to merge (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Name of the merged component
        #[arg(short, long)]
        name: String,

        /// Description of the merged component
        #[arg(short, long)]
        description: Option<String>,

        /// Write the updated snapshot here (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Set up color output
    output::setup_colors(&cli.color);

    let result = match cli.command {
        Commands::Validate { snapshot, strict } => {
            let config = validate::ValidateConfig {
                snapshot,
                strict,
                verbose: cli.verbose,
            };
            validate::validate(config).await
        }

        Commands::Usage {
            snapshot,
            component,
            json,
        } => {
            let config = usage::UsageConfig {
                snapshot,
                component,
                json,
                verbose: cli.verbose,
            };
            usage::usage(config).await
        }

        Commands::Merge {
            snapshot,
            ids,
            name,
            description,
            output,
        } => {
            let config = merge::MergeConfig {
                snapshot,
                ids,
                name,
                description,
                output,
                verbose: cli.verbose,
            };
            merge::merge(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
