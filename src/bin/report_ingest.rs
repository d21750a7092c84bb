use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use service_report_extract::{BatchOptions, Vendor};
use service_report_ingest::models::{DEFAULT_DATABASE_FILE, IngestSummary};
use service_report_ingest::{
    AssumeYes, Confirm, IngestError, PromptConfirm, ReportDatabase, ingest_folder,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "report-ingest",
    version,
    about = "Load wind turbine service reports into a SQLite database"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract every report in a folder and store it.
    Ingest(IngestArgs),
    /// Drop all report tables.
    DropTables(DestructiveArgs),
    /// Delete the database file.
    DeleteDatabase(DestructiveArgs),
}

#[derive(Debug, Args)]
struct IngestArgs {
    /// Report vendor: enercon or vestas.
    #[arg(long, value_parser = parse_vendor)]
    vendor: Vendor,

    /// Folder holding the PDF reports.
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_DATABASE_FILE)]
    database: PathBuf,

    /// Store checklist categories.
    #[arg(long)]
    categorize: bool,

    /// Print the summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct DestructiveArgs {
    #[arg(long, default_value = DEFAULT_DATABASE_FILE)]
    database: PathBuf,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,
}

fn parse_vendor(value: &str) -> Result<Vendor, String> {
    value.parse().map_err(|error: service_report_extract::ExtractError| error.to_string())
}

fn run_ingest(args: &IngestArgs) -> Result<IngestSummary> {
    let options = BatchOptions {
        categorize: args.categorize,
    };
    let summary = ingest_folder(args.vendor, &args.input, &args.database, &options)
        .with_context(|| format!("failed to ingest reports from '{}'", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!(
            "ingested {} report(s) into {}, {} failed",
            summary.ingested.len(),
            summary.database,
            summary.failed.len()
        );
    }
    Ok(summary)
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(PromptConfirm::new(io::stdin().lock(), io::stderr()))
    }
}

fn exit_for(result: Result<(), IngestError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(IngestError::Cancelled(message)) => {
            eprintln!("cancelled: {message}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("service_report_ingest=info,service_report_extract=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => match run_ingest(&args) {
            Ok(summary) if summary.failed.is_empty() => ExitCode::SUCCESS,
            Ok(_) => ExitCode::from(2),
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::DropTables(args) => exit_for(
            ReportDatabase::open_or_create(&args.database)
                .and_then(|db| db.drop_tables(confirmer(args.yes).as_mut())),
        ),
        Commands::DeleteDatabase(args) => exit_for(
            ReportDatabase::open_or_create(&args.database)
                .and_then(|db| db.delete_file(confirmer(args.yes).as_mut())),
        ),
    }
}
