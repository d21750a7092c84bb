use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use service_report_extract::{
    BatchOptions, BatchSummary, CsvOptions, ExtractionRegion, PageSpan, PdfSource, Rect, Vendor,
    extract_folder_to_csv, extract_grid_over_pages,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "report2csv",
    version,
    about = "Extract metadata and inspection checklists from wind turbine service reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract every report in a folder into metadata and checklist CSVs.
    Extract(ExtractArgs),
    /// Print the table found in one region of a PDF, for calibrating layouts.
    Region(RegionArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Report vendor: enercon or vestas.
    #[arg(long, value_parser = parse_vendor)]
    vendor: Vendor,

    /// Folder holding the PDF reports.
    #[arg(short, long)]
    input: PathBuf,

    /// Folder for metadata_<name>.csv files.
    #[arg(long)]
    metadata_out: PathBuf,

    /// Folder for inspection_<name>.csv files.
    #[arg(long)]
    checklist_out: PathBuf,

    /// Annotate checklist rows with their category.
    #[arg(long)]
    categorize: bool,

    /// Omit the leading index column.
    #[arg(long)]
    no_index: bool,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// List every failed report with its error.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct RegionArgs {
    /// PDF file to read.
    #[arg(short, long)]
    input: PathBuf,

    /// Area as x1,y1,x2,y2 in points (top-left, bottom-right).
    #[arg(long)]
    area: Rect,

    /// Column boundaries as comma-separated x coordinates.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<f32>,

    /// Page or page range, e.g. 2 or 2-4.
    #[arg(long, default_value = "1")]
    pages: PageSpan,

    /// Largest baseline distance within one row.
    #[arg(long, default_value_t = 13.0)]
    row_tol: f32,

    /// Split text runs that cross column boundaries.
    #[arg(long)]
    split_text: bool,
}

fn parse_vendor(value: &str) -> Result<Vendor, String> {
    value.parse().map_err(|error: service_report_extract::ExtractError| error.to_string())
}

fn csv_options(args: &ExtractArgs) -> Result<CsvOptions> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    let delimiter =
        u8::try_from(args.delimiter).context("delimiter must be a single ASCII character")?;
    Ok(CsvOptions {
        delimiter,
        include_index: !args.no_index,
    })
}

fn log_summary(summary: &BatchSummary, verbose: bool) {
    eprintln!(
        "processed {} report(s): {} succeeded, {} failed",
        summary.total(),
        summary.succeeded.len(),
        summary.failed.len()
    );
    if verbose {
        for failure in &summary.failed {
            eprintln!("  - {}: {}", failure.path.display(), failure.error);
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<BatchSummary> {
    let csv_options = csv_options(args)?;
    let batch_options = BatchOptions {
        categorize: args.categorize,
    };
    extract_folder_to_csv(
        args.vendor,
        &args.input,
        &args.metadata_out,
        &args.checklist_out,
        &batch_options,
        &csv_options,
    )
    .with_context(|| format!("failed to process reports in '{}'", args.input.display()))
}

fn run_region(args: &RegionArgs) -> Result<()> {
    let region = ExtractionRegion::new(args.area, &args.columns, args.row_tol)
        .with_split_text(args.split_text);
    let source = PdfSource::new(&args.input);
    let grid = extract_grid_over_pages(&source, args.pages.start, args.pages.end, &region)
        .with_context(|| format!("failed to read region from '{}'", args.input.display()))?;

    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    for row in grid.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("service_report_extract=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(summary) => {
                log_summary(&summary, args.verbose);
                if summary.all_succeeded() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Region(args) => match run_region(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
