#![allow(clippy::module_name_repetitions)]

//! Interactive TUI for the ingestion tool.
//!
//! Provides a menu-driven interface using `dialoguer` for loading and
//! checking the store without memorizing CLI flags.

use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::{Confirm, Input, Select};
use healthcare_chat_database::paths;

use crate::progress::ProgressCallback;

/// Default location of the CSV export.
pub const DEFAULT_CSV_PATH: &str = "data/healthcare_dataset.csv";

/// Top-level actions available in the ingest interactive menu.
enum IngestAction {
    LoadCsv,
    Verify,
}

impl IngestAction {
    const ALL: &[Self] = &[Self::LoadCsv, Self::Verify];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::LoadCsv => "Load CSV into the database",
            Self::Verify => "Verify loaded data",
        }
    }
}

/// Runs the interactive menu.
///
/// `make_progress` is called once the prompts are done, so a progress bar
/// never draws over them.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run<F>(make_progress: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce() -> Arc<dyn ProgressCallback>,
{
    let labels: Vec<&str> = IngestAction::ALL.iter().map(IngestAction::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let db_path = prompt_path("Database path", &paths::database_path_from_env())?;

    match IngestAction::ALL[idx] {
        IngestAction::LoadCsv => {
            let csv_path = prompt_path("CSV file", &PathBuf::from(DEFAULT_CSV_PATH))?;

            if !Confirm::new()
                .with_prompt(format!(
                    "Replace {} in {}?",
                    healthcare_chat_patient_models::TABLE_NAME,
                    db_path.display()
                ))
                .default(true)
                .interact()?
            {
                println!("Cancelled.");
                return Ok(());
            }

            let progress = make_progress();
            let report = tokio::task::spawn_blocking(move || {
                crate::load_csv(&csv_path, &db_path, &progress)
            })
            .await??;

            println!(
                "Loaded {} rows in {:.1}s",
                report.rows_loaded,
                report.duration.as_secs_f64()
            );
            for column in &report.missing_columns {
                println!("  warning: column {} was missing from the CSV", column.name());
            }
        }
        IngestAction::Verify => {
            let report = tokio::task::spawn_blocking(move || crate::verify(&db_path)).await??;
            print_verify(&report);
        }
    }

    Ok(())
}

/// Prints a [`crate::VerifyReport`] in human-readable form.
pub fn print_verify(report: &crate::VerifyReport) {
    println!("Rows: {}", report.row_count);
    if report.is_complete() {
        println!("All columns present.");
    } else {
        for column in &report.missing_columns {
            println!("Missing column: {}", column.name());
        }
    }
}

fn prompt_path(
    prompt: &str,
    default: &std::path::Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .default(default.display().to_string())
        .interact_text()?;

    Ok(PathBuf::from(input.trim()))
}
