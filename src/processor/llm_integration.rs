//! LLM integration functionality for the processor module

use rig::completion::CompletionModel;
use tracing::{debug, instrument, trace};

use crate::model::complete_text;
use crate::processor::ProcessorConfig;
use crate::processor::chunking::QAChunk;
use crate::processor::error::ProcessError;
use crate::processor::records::{QARecord, records_from_json};

const STRICT_PREAMBLE: &str = "You are an expert in Islamic scholarship who extracts question and answer pairs for training data. You only extract pairs whose source and exact reference are stated in the text.";

const LENIENT_PREAMBLE: &str = "You are an assistant who extracts educational question and answer pairs from text for training data.";

const STRICT_INSTRUCTIONS: &str = "Only include a pair when the text names its source (for example Quran or Sahih al-Bukhari) and an exact reference (a verse such as 2:255 or a hadith number). Skip anything without a verifiable reference.";

const LENIENT_INSTRUCTIONS: &str = "Include any informative pair. When the text gives no exact reference, use the work or site the text comes from as the source and the section or topic as the reference.";

/// Preamble for the extraction mode
pub fn preamble(strict: bool) -> &'static str {
    if strict { STRICT_PREAMBLE } else { LENIENT_PREAMBLE }
}

/// Build the extraction prompt for one chunk
pub fn extraction_prompt(chunk: &QAChunk, strict: bool) -> String {
    let instructions = if strict {
        STRICT_INSTRUCTIONS
    } else {
        LENIENT_INSTRUCTIONS
    };
    format!(
        "Extract question-answer pairs from the text below. {}\n\n\
        This is part {} of {}.\n\n\
        Text:\n{}\n\n\
        Respond with a JSON array only:\n\
        [{{\"question\": \"...\", \"answer\": \"...\", \"source\": \"...\", \"reference\": \"...\", \"category\": \"...\"}}]\n\
        Respond with [] if the text has no suitable pairs.",
        instructions,
        chunk.index + 1,
        chunk.total,
        chunk.text
    )
}

/// Send one chunk to the extraction service and return the raw reply
#[instrument(skip(model, chunk, config), fields(chunk = chunk.index, total = chunk.total))]
pub async fn request_chunk<M: CompletionModel>(
    model: &M,
    chunk: &QAChunk,
    strict: bool,
    config: &ProcessorConfig,
) -> Result<String, ProcessError> {
    debug!("Requesting extraction for {} characters", chunk.text.len());

    let reply = complete_text(
        model,
        preamble(strict),
        extraction_prompt(chunk, strict),
        config.temperature,
        config.max_tokens,
    )
    .await?;

    trace!("Extraction reply of length {}", reply.len());
    Ok(reply)
}

/// Parse an extraction reply into valid records
pub fn parse_records_reply(reply: &str) -> Result<Vec<QARecord>, ProcessError> {
    records_from_json(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockCompletionModel;

    fn chunk() -> QAChunk {
        QAChunk {
            text: "Ayat al-Kursi is verse 2:255 of the Quran.".to_string(),
            index: 1,
            total: 3,
        }
    }

    #[test]
    fn test_prompt_modes() {
        let strict = extraction_prompt(&chunk(), true);
        let lenient = extraction_prompt(&chunk(), false);

        assert!(strict.contains("part 2 of 3"));
        assert!(strict.contains("Ayat al-Kursi"));
        assert!(strict.contains(STRICT_INSTRUCTIONS));
        assert!(lenient.contains(LENIENT_INSTRUCTIONS));
        assert_ne!(preamble(true), preamble(false));
    }

    #[tokio::test]
    async fn test_request_chunk_uses_mode_preamble() {
        let model = MockCompletionModel::new();
        model.push_text("[]").await;

        let reply = request_chunk(&model, &chunk(), true, &ProcessorConfig::default())
            .await
            .unwrap();
        assert_eq!(reply, "[]");
        assert_eq!(model.preambles().await, vec![STRICT_PREAMBLE.to_string()]);
    }

    #[tokio::test]
    async fn test_request_chunk_transport_error() {
        let model = MockCompletionModel::new();
        model.push_error("rate limited").await;

        let result = request_chunk(&model, &chunk(), false, &ProcessorConfig::default()).await;
        assert!(matches!(result, Err(ProcessError::Llm(msg)) if msg.contains("rate limited")));
    }
}
