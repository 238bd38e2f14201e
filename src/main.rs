use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use twb_bridge::cli::{self, ConvertOptions};
use twb_bridge::pbip::IdStrategy;

#[derive(Parser)]
#[command(name = "twb-bridge")]
#[command(about = "Convert a Tableau workbook (.twb/.twbx) into a Power BI Project (PBIP).")]
#[command(long_about = "twb-bridge - Tableau → Power BI Project converter

Extracts data sources, fields and worksheets from a Tableau workbook and
writes a PBIP project: a TMDL semantic model (columns, DAX measures translated
from calculated fields, stub partitions) and a PBIR report with one empty page
per worksheet.

OUTPUT LAYOUT:
  <name>.pbip
  <name>.SemanticModel/definition/{model,expressions}.tmdl
  <name>.SemanticModel/definition/tables/<datasource>.tmdl
  <name>.Report/definition/report.json
  <name>.Report/definition/pages/<page-id>/page.json
  .pbi/localSettings.json

EXAMPLES:
  twb-bridge Superstore.twbx                    # Writes to ./output
  twb-bridge Superstore.twb -o superstore-pbip  # Custom output directory
  twb-bridge Superstore.twbx --stable-ids       # Reproducible identifiers

Set RUST_LOG=twb_bridge=debug for extraction details.")]
#[command(version)]
struct Cli {
    /// Path to .twb or .twbx file
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output", env = "TWB_BRIDGE_OUTPUT")]
    output: PathBuf,

    /// Derive identifiers from names so repeated runs produce identical files
    #[arg(long, env = "TWB_BRIDGE_STABLE_IDS")]
    stable_ids: bool,

    /// Show extracted model and generated files
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:?}", "❌ Error:".bold().red(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> anyhow::Result<()> {
    let options = ConvertOptions {
        output: args.output,
        id_strategy: if args.stable_ids {
            IdStrategy::Stable
        } else {
            IdStrategy::Random
        },
        verbose: args.verbose,
    };

    cli::convert(&args.input, &options)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "twb_bridge=debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
