//! Prompt construction for the two model calls.
//!
//! The wording here is part of the pipeline's behavior: the synthesis
//! prompt must keep the model to bare SQL and the summary prompt must keep
//! it away from [`FORBIDDEN_PREAMBLE`].

use healthcare_chat_patient_models::schema_description;

use crate::providers::Message;

/// Rote opening the summarizer is told never to produce.
pub const FORBIDDEN_PREAMBLE: &str = "Based on the provided SQL query and data, I can summarize the result as follows: According to the query,";

/// Builds the system prompt for SQL synthesis, embedding the table
/// descriptor.
#[must_use]
pub fn synthesis_system_prompt() -> String {
    format!(
        "You are an AI assistant that converts natural language questions into SQL queries \
         for a healthcare database.\n\n\
         The database schema is as follows:\n\
         {schema}\n\n\
         Rules:\n\
         - Write a single read-only SELECT statement in the DuckDB SQL dialect.\n\
         - Use only the table and columns listed above.\n\
         - Compare text columns case-insensitively (for example with ILIKE or LOWER).\n\
         - Return only the SQL query. No explanations, comments, or markdown code fences.",
        schema = schema_description(),
    )
}

/// Builds the synthesis exchange for `question`.
#[must_use]
pub fn synthesis_messages(question: &str) -> Vec<Message> {
    vec![
        Message::system(synthesis_system_prompt()),
        Message::user(format!(
            "Convert this natural language question to an SQL query: '{question}'"
        )),
    ]
}

/// System prompt for summarizing a query result.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an AI assistant that summarizes SQL query \
    results into clear, user-friendly responses. Given a user question and the data returned \
    for it, provide a concise and informative answer. If the data describes an error, explain \
    plainly that the answer could not be retrieved.";

/// Builds the summary exchange for `question` and the rendered result.
#[must_use]
pub fn summary_messages(question: &str, data: &str) -> Vec<Message> {
    vec![
        Message::system(SUMMARY_SYSTEM_PROMPT),
        Message::user(format!(
            "User Query: {question}\nSQL Data: {data}\n\
             Please summarize this data in a natural and informative way. \
             Do not start with \"{FORBIDDEN_PREAMBLE}\""
        )),
    ]
}
