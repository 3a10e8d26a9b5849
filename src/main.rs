use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pim_master::config::{EnrichmentConfig, PipelineConfig};
use pim_master::enrich::OllamaGenerator;
use pim_master::pipeline::{self, MasterInputs};
use pim_master::{PimError, Result, clean};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| PimError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Master(args) => execute_master(args),
        Command::Bronze(args) => {
            let rows = pipeline::bronze_files(&args.afi, &args.storis, &args.output)?;
            println!("Rows: {rows}");
            Ok(())
        }
        Command::Silver(args) => {
            let rows = if args.columns.is_empty() {
                pipeline::silver_files(&args.input, &args.output, &clean::DEFAULT_TEXT_COLUMNS)?
            } else {
                pipeline::silver_files(&args.input, &args.output, &args.columns)?
            };
            println!("Rows: {rows}");
            Ok(())
        }
        Command::Gold(args) => execute_gold(args),
    }
}

fn execute_master(args: MasterArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let inputs = MasterInputs {
        entities: args.entities,
        storis: args.storis,
        via_product: args.via_product,
        translator: args.translator,
    };
    let report = pipeline::build_master_files(&inputs, &args.output, &config)?;

    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }
    print!("{report}");
    println!("Done.");
    Ok(())
}

fn execute_gold(args: GoldArgs) -> Result<()> {
    let config = EnrichmentConfig::load(&args.config)?;
    let generator = OllamaGenerator::new(&config)?;
    let every = args.progress_every.max(1);
    let rows = pipeline::gold_files(&args.input, &args.output, &config, &generator, |done, total| {
        if done % every == 0 || done == total {
            info!(done, total, "enrichment progress");
        }
    })?;
    println!("Rows: {rows}");
    Ok(())
}

fn write_report(path: &Path, report: &pim_master::report::CoverageReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile product exports into a single product information master."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the master table from the API, ERP, storefront and translator exports.
    Master(MasterArgs),
    /// Inner-join AFI and STORIS exports and keep the descriptive columns.
    Bronze(BronzeArgs),
    /// Clean free-text columns.
    Silver(SilverArgs),
    /// Generate marketing copy through the configured text-generation service.
    Gold(GoldArgs),
}

#[derive(clap::Args)]
struct MasterArgs {
    /// API entities export (primary table).
    #[arg(long)]
    entities: PathBuf,

    /// STORIS product export.
    #[arg(long)]
    storis: PathBuf,

    /// VIA product export.
    #[arg(long)]
    via_product: PathBuf,

    /// VIA tagging translator table.
    #[arg(long)]
    translator: PathBuf,

    /// Output table path (.csv, .tsv or .xlsx).
    #[arg(long)]
    output: PathBuf,

    /// Optional YAML join plan replacing the built-in one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Optional path for the coverage report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
struct BronzeArgs {
    /// AFI product export.
    #[arg(long)]
    afi: PathBuf,

    /// STORIS product export.
    #[arg(long)]
    storis: PathBuf,

    /// Output table path.
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct SilverArgs {
    /// Input table path.
    #[arg(long)]
    input: PathBuf,

    /// Output table path.
    #[arg(long)]
    output: PathBuf,

    /// Columns to clean; defaults to name, description_a and description_b.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
}

#[derive(clap::Args)]
struct GoldArgs {
    /// Input table path.
    #[arg(long)]
    input: PathBuf,

    /// Output table path.
    #[arg(long)]
    output: PathBuf,

    /// YAML file with the model, prompts and endpoint.
    #[arg(long)]
    config: PathBuf,

    /// Log progress every N rows.
    #[arg(long, default_value_t = 25)]
    progress_every: usize,
}
