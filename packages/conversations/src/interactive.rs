//! Interactive chat session in the terminal.
//!
//! Prompts for questions until an empty line or `exit`, then offers to
//! print or export the session transcript.

use std::path::PathBuf;

use dialoguer::{Input, Select};
use healthcare_chat_ai::pipeline::Pipeline;

use crate::{DEFAULT_EXPORT_PATH, Transcript, ask};

/// What to do with the transcript once the session ends.
enum TranscriptAction {
    Show,
    Export,
    Quit,
}

impl TranscriptAction {
    const ALL: &[Self] = &[Self::Show, Self::Export, Self::Quit];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Show => "Show transcript",
            Self::Export => "Export transcript (JSON)",
            Self::Quit => "Quit",
        }
    }
}

/// Runs an interactive chat session against a pipeline built from the
/// environment.
///
/// # Errors
///
/// Returns an error if no model provider is configured, a prompt fails, or
/// the export cannot be written.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (pipeline, _store) = Pipeline::from_env().await?;
    chat(&pipeline).await
}

/// Runs the question loop over `pipeline`.
///
/// # Errors
///
/// Returns an error if a prompt fails or the export cannot be written.
pub async fn chat(pipeline: &Pipeline) -> Result<(), Box<dyn std::error::Error>> {
    println!("Ask about the patient data. Submit an empty line or `exit` to finish.");
    println!();

    let mut transcript = Transcript::new();

    loop {
        let question: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let question = question.trim();

        if question.is_empty() || question.eq_ignore_ascii_case("exit") {
            break;
        }

        let response = ask(pipeline, &mut transcript, question).await;
        println!();
        println!("SQL: {}", response.query);
        println!();
        println!("{}", response.response);
        println!();
    }

    if transcript.is_empty() {
        return Ok(());
    }

    let labels: Vec<&str> = TranscriptAction::ALL
        .iter()
        .map(TranscriptAction::label)
        .collect();

    loop {
        let idx = Select::new()
            .with_prompt(format!(
                "Session finished ({} exchanges)",
                transcript.exchanges()
            ))
            .items(&labels)
            .default(TranscriptAction::ALL.len() - 1)
            .interact()?;

        match TranscriptAction::ALL[idx] {
            TranscriptAction::Show => println!("{}", transcript.format()),
            TranscriptAction::Export => {
                let path: String = Input::new()
                    .with_prompt("Export path")
                    .default(DEFAULT_EXPORT_PATH.to_string())
                    .interact_text()?;
                let path = PathBuf::from(path.trim());
                transcript.export(&path)?;
                println!("Wrote {}", path.display());
            }
            TranscriptAction::Quit => return Ok(()),
        }
    }
}
