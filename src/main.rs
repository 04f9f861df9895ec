use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use cmhr_refinery::config::Config;
use cmhr_refinery::domain::ResourceRecord;
use cmhr_refinery::error::Result;
use cmhr_refinery::logging;
use cmhr_refinery::pipeline::{normalize, Refinery, RunSummary};
use cmhr_refinery::storage;

#[derive(Parser)]
#[command(name = "cmhr_refinery")]
#[command(about = "Canadian mental health resources dataset refinery")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize, categorize and deduplicate a source table
    Refine {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Existing dataset whose rows win dedup collisions with the new batch
        #[arg(long)]
        merge: Option<PathBuf>,
    },
    /// Drop rows whose link fails a liveness probe, then re-run the keyword pass
    Verify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Backfill missing coordinates and drop rows that stay unresolved
    Geocode {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Run the full pipeline (refine, verify, geocode) in one pass
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Existing dataset whose rows win dedup collisions with the new batch
        #[arg(long)]
        merge: Option<PathBuf>,
    },
}

/// Reads an already-refined table back as canonical records, no gates applied.
fn load_records(path: &Path) -> Result<Vec<ResourceRecord>> {
    let rows = storage::read_raw_rows(path)?;
    Ok(rows.iter().map(normalize::normalize_row).collect())
}

fn load_existing(path: Option<&PathBuf>) -> Result<Vec<ResourceRecord>> {
    match path {
        Some(path) => load_records(path),
        None => Ok(Vec::new()),
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 Refinery results:");
    println!("   Rows read: {}", summary.rows_read);
    println!("   French rows removed: {}", summary.french_removed);
    println!("   Invalid rows removed: {}", summary.invalid_removed);
    println!("   Dead-link rows removed: {}", summary.dead_links_removed);
    println!("   Employment rows removed: {}", summary.employment_removed);
    println!(
        "   Overridden to Indigenous Support: {}",
        summary.indigenous_overridden
    );
    println!("   Duplicate rows removed: {}", summary.duplicates_removed);
    println!("   Unresolved rows removed: {}", summary.unresolved_removed);
    println!("   Rows written: {}", summary.rows_written);
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    let refinery = Refinery::new(config);

    match cli.command {
        Commands::Refine {
            input,
            output,
            merge,
        } => {
            println!("🔄 Refining {}...", input.display());
            let rows = storage::read_raw_rows(&input)?;
            let existing = load_existing(merge.as_ref())?;

            let mut summary = RunSummary::default();
            let records = refinery.refine(&rows, existing, &mut summary);
            summary.rows_written = records.len();

            storage::write_records(&output, &records)?;
            info!("Refine finished: {} rows written", records.len());
            print_summary(&summary);
        }
        Commands::Verify { input, output } => {
            println!("🔗 Verifying links in {}...", input.display());
            let records = load_records(&input)?;

            let mut summary = RunSummary::default();
            summary.rows_read = records.len();
            let records = refinery.verify_links(records, &mut summary).await;
            summary.rows_written = records.len();

            storage::write_records(&output, &records)?;
            info!("Verify finished: {} rows written", records.len());
            print_summary(&summary);
        }
        Commands::Geocode { input, output } => {
            println!("📍 Geocoding {}...", input.display());
            let records = load_records(&input)?;

            let mut summary = RunSummary::default();
            summary.rows_read = records.len();
            let records = refinery.resolve_coordinates(records, &mut summary).await;
            summary.rows_written = records.len();

            storage::write_records(&output, &records)?;
            info!("Geocode finished: {} rows written", records.len());
            print_summary(&summary);
        }
        Commands::Run {
            input,
            output,
            merge,
        } => {
            println!("🚀 Running full pipeline on {}...", input.display());
            let rows = storage::read_raw_rows(&input)?;
            let existing = load_existing(merge.as_ref())?;

            let (records, summary) = refinery.run(&rows, existing).await;

            storage::write_records(&output, &records)?;
            info!("Full run finished: {} rows written", records.len());
            print_summary(&summary);
        }
    }

    Ok(())
}
