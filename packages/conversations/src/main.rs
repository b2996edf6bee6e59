#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal interface to the question-answering pipeline.
//!
//! ```text
//! healthcare_chat_conversations ask "How many male patients are there?"
//! healthcare_chat_conversations ask --json "Which blood type is most common?"
//! ```
//!
//! Running with no subcommand starts an interactive session.

use clap::{Parser, Subcommand};
use healthcare_chat_ai::pipeline::Pipeline;
use healthcare_chat_conversations::{Transcript, ask};

#[derive(Parser)]
#[command(
    name = "healthcare_chat_conversations",
    about = "Ask questions about the patient data from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the SQL and answer
    Ask {
        /// The question, in plain language
        question: String,
        /// Print the `{query, response}` object as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return healthcare_chat_conversations::interactive::run().await;
    };

    match command {
        Commands::Ask { question, json } => {
            let (pipeline, _store) = Pipeline::from_env().await?;
            let mut transcript = Transcript::new();
            let response = ask(&pipeline, &mut transcript, &question).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("SQL: {}", response.query);
                println!();
                println!("{}", response.response);
            }
        }
    }

    Ok(())
}
