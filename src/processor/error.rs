//! Error types for the processor module

use thiserror::Error;

/// Error type for processor operations
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Extraction service call failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// Extraction reply did not contain a usable JSON array
    #[error("Reply parsing error: {0}")]
    ReplyParse(String),
}

impl From<rig::completion::CompletionError> for ProcessError {
    fn from(err: rig::completion::CompletionError) -> Self {
        Self::Llm(err.to_string())
    }
}
