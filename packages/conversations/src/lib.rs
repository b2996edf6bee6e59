#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chat transcript for terminal sessions with the pipeline.
//!
//! A [`Transcript`] is append-only: each exchange adds the user's question,
//! the generated SQL and the assistant's answer, in that order. It lives
//! for one session and can be printed or exported as JSON.

pub mod interactive;

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use healthcare_chat_ai::pipeline::{Pipeline, PipelineResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default path for transcript exports.
pub const DEFAULT_EXPORT_PATH: &str = "data/transcript.json";

/// Errors from transcript operations.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    /// The person asking.
    User,
    /// The synthesized SQL (or its error text).
    Sql,
    /// The summarized answer.
    Assistant,
}

impl EntryRole {
    const fn heading(self) -> &'static str {
        match self {
            Self::User => "--- USER ---",
            Self::Sql => "--- SQL ---",
            Self::Assistant => "--- ASSISTANT ---",
        }
    }
}

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Producer of the entry.
    pub role: EntryRole,
    /// Entry text.
    pub content: String,
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
}

/// Append-only record of a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    id: String,
    started_at: DateTime<Utc>,
    entries: Vec<TranscriptEntry>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Starts an empty transcript with a fresh session ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Entries in the order they were recorded.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of completed exchanges.
    #[must_use]
    pub fn exchanges(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.role == EntryRole::User)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends one exchange.
    pub fn record(&mut self, question: &str, response: &PipelineResponse) {
        let at = Utc::now();
        for (role, content) in [
            (EntryRole::User, question),
            (EntryRole::Sql, response.query.as_str()),
            (EntryRole::Assistant, response.response.as_str()),
        ] {
            self.entries.push(TranscriptEntry {
                role,
                content: content.to_string(),
                at,
            });
        }
    }

    /// Renders the transcript for the terminal.
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        for entry in &self.entries {
            let _ = writeln!(output, "{}", entry.role.heading());
            let _ = writeln!(output, "{}", entry.content);
            let _ = writeln!(output);
        }
        output
    }

    /// Serializes the transcript as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConversationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the JSON export to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError`] if serialization or the write fails.
    pub fn export(&self, path: &Path) -> Result<(), ConversationError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Exported transcript {} to {}", self.id, path.display());
        Ok(())
    }
}

/// Runs `question` through `pipeline` and records the exchange.
pub async fn ask(
    pipeline: &Pipeline,
    transcript: &mut Transcript,
    question: &str,
) -> PipelineResponse {
    let response = pipeline.handle(question).await;
    transcript.record(question, &response);
    response
}
