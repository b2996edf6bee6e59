#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive CLI orchestrator for the healthcare chat toolchain.
//!
//! Provides a unified entry point that lets users interactively select
//! which tool to run (ingest, server, chat) and guides them through the
//! configuration for each.
//!
//! Uses `indicatif-log-bridge` (via [`healthcare_chat_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

use dialoguer::Select;
use healthcare_chat_cli_utils::IndicatifProgress;

/// Top-level tool selection for the healthcare chat toolchain.
enum Tool {
    Ingest,
    Server,
    Chat,
}

impl Tool {
    const ALL: &[Self] = &[Self::Ingest, Self::Server, Self::Chat];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Ingest => "Ingest data",
            Self::Server => "Start server",
            Self::Chat => "Chat with the data",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = healthcare_chat_cli_utils::init_logger();

    println!("Healthcare Chat Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Ingest => {
            healthcare_chat_ingest::interactive::run(|| {
                IndicatifProgress::records_bar(&multi, "Reading CSV")
            })
            .await?;
        }
        Tool::Server => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(healthcare_chat_server::interactive::run())
            })
            .await??;
        }
        Tool::Chat => healthcare_chat_conversations::interactive::run().await?,
    }

    Ok(())
}
