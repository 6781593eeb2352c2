use std::path::PathBuf;

use boq_sync::sync::PassSummary;
use boq_sync::{Result, SyncError, catalog, logging, sync};
use clap::{Parser, Subcommand};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Export(args) => execute(args, Direction::Export),
        Command::Import(args) => execute(args, Direction::Import),
    }
}

enum Direction {
    Export,
    Import,
}

fn execute(args: PassArgs, direction: Direction) -> Result<()> {
    if !args.workbook.exists() {
        return Err(SyncError::MissingInput(args.workbook));
    }
    if !args.elements.exists() {
        return Err(SyncError::MissingInput(args.elements));
    }

    let catalog = match &args.catalog {
        Some(path) => catalog::load_catalog(path)?,
        None => catalog::builtin_schemas(),
    };
    let selected = catalog::select(&catalog, &args.schemas, args.all)?;
    if selected.is_empty() {
        info!("no schemas selected; nothing to do");
        return Ok(());
    }

    let summaries: Vec<PassSummary> = match direction {
        Direction::Export => sync::export_files(&args.workbook, &args.elements, &selected)?
            .into_iter()
            .map(PassSummary::Export)
            .collect(),
        Direction::Import => sync::import_files(&args.workbook, &args.elements, &selected)?
            .into_iter()
            .map(PassSummary::Import)
            .collect(),
    };

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!("{}", render_summary(summary));
        }
    }
    Ok(())
}

fn render_summary(summary: &PassSummary) -> String {
    match summary {
        PassSummary::Export(s) => match &s.skipped {
            Some(reason) => format!("[{}] skipped: {reason}", s.schema),
            None => format!(
                "[{}] records {} | updated {} | appended {} | deleted {}",
                s.schema, s.records, s.updated, s.appended, s.deleted
            ),
        },
        PassSummary::Import(s) => match &s.skipped {
            Some(reason) => format!("[{}] skipped: {reason}", s.schema),
            None => format!(
                "[{}] rules {} | matched keys {} | updated elements {} | unmatched {}",
                s.schema, s.rules, s.matched_keys, s.updated_elements, s.unmatched_elements
            ),
        },
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Keep a building-services element snapshot and a BoQ workbook in sync."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Push the current element set into the workbook.
    Export(PassArgs),
    /// Pull workbook values back onto matching elements.
    Import(PassArgs),
}

#[derive(clap::Args)]
struct PassArgs {
    /// Workbook file shared by every selected schema pass.
    #[arg(long)]
    workbook: PathBuf,

    /// Element snapshot file (JSON).
    #[arg(long)]
    elements: PathBuf,

    /// Schema to run; repeat for several.
    #[arg(long = "schema")]
    schemas: Vec<String>,

    /// Run every schema in the catalog.
    #[arg(long)]
    all: bool,

    /// Replace the built-in schema catalog with a JSON file.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the per-schema summaries as JSON.
    #[arg(long)]
    summary_json: bool,
}
