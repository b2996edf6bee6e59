#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the healthcare data ingestion tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use healthcare_chat_database::paths;
use healthcare_chat_ingest::interactive::{DEFAULT_CSV_PATH, print_verify};
use healthcare_chat_ingest::progress::null_progress;
use healthcare_chat_ingest::{load_csv, verify};

#[derive(Parser)]
#[command(name = "healthcare_chat_ingest", about = "Healthcare data ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the patient table with the contents of a CSV export
    Load {
        /// CSV file to load
        #[arg(long, default_value = DEFAULT_CSV_PATH)]
        csv: PathBuf,
        /// `DuckDB` file to write (defaults to `DATABASE_PATH` or
        /// `data/healthcare.duckdb`)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the row count and check that every column exists
    Verify {
        /// `DuckDB` file to check
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return healthcare_chat_ingest::interactive::run(null_progress).await;
    };

    match command {
        Commands::Load { csv, db } => {
            let db = db.unwrap_or_else(paths::database_path_from_env);
            let report = load_csv(&csv, &db, &null_progress())?;
            println!(
                "Loaded {} rows into {} in {:.1}s",
                report.rows_loaded,
                db.display(),
                report.duration.as_secs_f64()
            );
        }
        Commands::Verify { db } => {
            let db = db.unwrap_or_else(paths::database_path_from_env);
            let report = verify(&db)?;
            print_verify(&report);
            if !report.is_complete() {
                return Err("table is missing columns".into());
            }
        }
    }

    Ok(())
}
