//! Content processor module
//!
//! Turns raw text, typically a crawl's combined output or an uploaded
//! document, into question/answer/source/reference records. The text is
//! split into size-bounded chunks and each chunk is sent to the extraction
//! service in order.

mod chunking;
mod config;
mod error;
mod llm_integration;
mod records;

pub use chunking::{QAChunk, chunk_text};
pub use config::{ProcessorConfig, ProcessorConfigBuilder};
pub use error::ProcessError;
pub use llm_integration::{extraction_prompt, parse_records_reply, request_chunk};
pub use records::{
    ChatMessage, DEFAULT_CATEGORY, QARecord, TRAINING_SYSTEM_PROMPT, TrainingExample,
    records_from_json,
};

use rig::completion::CompletionModel;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Result of an extraction run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    /// False when there was no text or the service never answered
    pub success: bool,

    /// Human-readable summary
    pub message: String,

    /// Valid records in chunk order
    pub records: Vec<QARecord>,

    /// Number of chunks the text was split into
    pub chunks: usize,

    /// Chunks whose reply could not be parsed
    pub malformed_chunks: usize,

    /// Chunks whose service call failed
    pub failed_chunks: usize,
}

impl ExtractionOutcome {
    fn failure(message: impl Into<String>, chunks: usize, failed_chunks: usize) -> Self {
        Self {
            success: false,
            message: message.into(),
            records: Vec::new(),
            chunks,
            malformed_chunks: 0,
            failed_chunks,
        }
    }
}

/// Extracts records from text with a completion model
#[derive(Debug, Clone)]
pub struct Extractor<M> {
    model: M,
    config: ProcessorConfig,
}

impl<M: CompletionModel> Extractor<M> {
    pub fn new(model: M, config: ProcessorConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Extract records from `text`.
    ///
    /// With `strict` set only records citing a verifiable source and
    /// reference are requested. Never fails: a malformed reply skips its
    /// chunk, and the outcome is unsuccessful only for blank input or when
    /// every chunk's service call failed.
    #[instrument(skip_all, fields(len = text.len(), strict))]
    pub async fn extract_records(&self, text: &str, strict: bool) -> ExtractionOutcome {
        if text.trim().is_empty() {
            return ExtractionOutcome::failure("No text provided for extraction", 0, 0);
        }

        let chunks = chunk_text(text, self.config.max_chunk_chars);
        info!("Extracting records from {} chunk(s)", chunks.len());

        let mut records = Vec::new();
        let mut malformed_chunks = 0;
        let mut failed_chunks = 0;
        let mut requested = 0;
        let mut last_error = None;

        for chunk in &chunks {
            if chunk.text.trim().is_empty() {
                continue;
            }
            requested += 1;
            match request_chunk(&self.model, chunk, strict, &self.config).await {
                Ok(reply) => match parse_records_reply(&reply) {
                    Ok(found) => records.extend(found),
                    Err(e) => {
                        warn!("Skipping chunk {}/{}: {}", chunk.index + 1, chunk.total, e);
                        malformed_chunks += 1;
                    }
                },
                Err(e) => {
                    warn!("Extraction failed for chunk {}/{}: {}", chunk.index + 1, chunk.total, e);
                    failed_chunks += 1;
                    last_error = Some(e);
                }
            }
            sleep(self.config.chunk_delay).await;
        }

        if failed_chunks == requested {
            let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
            return ExtractionOutcome::failure(
                format!("Extraction service unavailable: {}", reason),
                chunks.len(),
                failed_chunks,
            );
        }

        let mut message = format!(
            "Extracted {} Q&A record(s) from {} chunk(s)",
            records.len(),
            chunks.len()
        );
        if malformed_chunks + failed_chunks > 0 {
            message.push_str(&format!(
                " ({} chunk(s) skipped)",
                malformed_chunks + failed_chunks
            ));
        }
        info!("{}", message);

        ExtractionOutcome {
            success: true,
            message,
            records,
            chunks: chunks.len(),
            malformed_chunks,
            failed_chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockCompletionModel;
    use std::time::Duration;

    const ONE_RECORD: &str = r#"```json
[{"question": "What is Salah?", "answer": "The five daily prayers.", "source": "Quran", "reference": "2:43", "category": "Prayer"}]
```"#;

    fn extractor(model: MockCompletionModel, max_chunk_chars: usize) -> Extractor<MockCompletionModel> {
        let config = ProcessorConfig::builder()
            .max_chunk_chars(max_chunk_chars)
            .chunk_delay(Duration::ZERO)
            .build();
        Extractor::new(model, config)
    }

    #[tokio::test]
    async fn test_blank_text_fails_without_calls() {
        let model = MockCompletionModel::new();
        let outcome = extractor(model.clone(), 8000).extract_records("  \n ", true).await;

        assert!(!outcome.success);
        assert!(outcome.records.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_records_from_every_chunk_in_order() {
        let model = MockCompletionModel::new();
        model.push_text(ONE_RECORD).await;
        model
            .push_text(r#"[{"question": "What is Sawm?", "answer": "Fasting.", "source": "Quran", "reference": "2:183"}]"#)
            .await;

        let text = format!("{} {}", "a".repeat(10), "b".repeat(10));
        let outcome = extractor(model.clone(), 12).extract_records(&text, true).await;

        assert!(outcome.success);
        assert_eq!(outcome.chunks, 2);
        assert_eq!(model.calls(), 2);
        let questions: Vec<_> = outcome.records.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["What is Salah?", "What is Sawm?"]);
        assert_eq!(outcome.records[1].category, DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_skipped() {
        let model = MockCompletionModel::new();
        model.push_text("Sorry, I cannot help with that.").await;
        model.push_text(ONE_RECORD).await;

        let text = format!("{} {}", "a".repeat(10), "b".repeat(10));
        let outcome = extractor(model, 12).extract_records(&text, false).await;

        assert!(outcome.success);
        assert_eq!(outcome.malformed_chunks, 1);
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.message.contains("1 chunk(s) skipped"));
    }

    #[tokio::test]
    async fn test_invalid_records_never_returned() {
        let model = MockCompletionModel::new();
        model
            .push_text(r#"[{"question": "Q", "answer": "A", "source": " ", "reference": "1"}]"#)
            .await;

        let outcome = extractor(model, 8000).extract_records("Some text", true).await;
        assert!(outcome.success);
        assert!(outcome.records.is_empty());
    }

    #[tokio::test]
    async fn test_all_calls_failing_is_unsuccessful() {
        let model = MockCompletionModel::new();
        model.set_default_error("connection refused").await;

        let text = format!("{} {}", "a".repeat(10), "b".repeat(10));
        let outcome = extractor(model, 12).extract_records(&text, true).await;

        assert!(!outcome.success);
        assert_eq!(outcome.failed_chunks, 2);
        assert!(outcome.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_whitespace_only_chunk_is_not_sent() {
        let model = MockCompletionModel::new();
        model.push_text(ONE_RECORD).await;
        model.push_text("[]").await;

        let outcome = extractor(model.clone(), 4).extract_records("abcd efgh", true).await;

        assert!(outcome.success);
        assert_eq!(outcome.chunks, 3);
        assert_eq!(model.calls(), 2);
        assert_eq!(outcome.records.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_service_failure_still_succeeds() {
        let model = MockCompletionModel::new();
        model.push_error("timeout").await;
        model.push_text(ONE_RECORD).await;

        let text = format!("{} {}", "a".repeat(10), "b".repeat(10));
        let outcome = extractor(model, 12).extract_records(&text, true).await;

        assert!(outcome.success);
        assert_eq!(outcome.failed_chunks, 1);
        assert_eq!(outcome.records.len(), 1);
    }
}
