//! Model-assisted quality and topicality judgment

use rig::completion::CompletionModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::model::complete_text;
use crate::relevance::RelevanceConfig;
use crate::reply::{ParsedReply, bool_field, f64_field, parse_json_object, str_field};

const CLASSIFIER_PREAMBLE: &str = "You are an expert content analyst specializing in Islamic knowledge and web content quality assessment.";

/// Confidence assigned when the reply could not be parsed
const UNPARSABLE_CONFIDENCE: f64 = 0.3;

/// Confidence assigned when the service call itself failed
const UNREACHABLE_CONFIDENCE: f64 = 0.2;

/// Keywords used for topicality when the reply is unusable
const FALLBACK_TOPIC_KEYWORDS: &[&str] = &["islamic", "quran"];

/// The classifier's judgment of one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticJudgment {
    /// Educational or informative rather than ads, navigation or noise
    pub is_quality: bool,

    /// Contains domain knowledge
    pub is_on_topic: bool,

    /// Classifier confidence, clamped to 0.0..=1.0
    pub confidence: f64,

    /// Short description of the content
    pub summary: String,
}

impl SemanticJudgment {
    /// Conservative judgment for an unparsable reply: keep the page, decide
    /// topicality by a plain substring check, and lower the confidence.
    pub fn unparsable(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self {
            is_quality: true,
            is_on_topic: FALLBACK_TOPIC_KEYWORDS.iter().any(|k| lower.contains(k)),
            confidence: UNPARSABLE_CONFIDENCE,
            summary: "Classifier reply could not be parsed, using fallback".to_string(),
        }
    }

    /// Conservative judgment for a failed service call
    pub fn unreachable(reason: &str) -> Self {
        Self {
            is_quality: true,
            is_on_topic: false,
            confidence: UNREACHABLE_CONFIDENCE,
            summary: format!("Classifier error: {}", reason),
        }
    }
}

/// Interpret a classifier reply.
///
/// Missing keys take neutral defaults (quality true, off topic, confidence
/// 0.5). A reply with no JSON object at all yields the fallback judgment.
pub fn parse_judgment(reply: &str, text: &str) -> ParsedReply<SemanticJudgment> {
    let Some(map) = parse_json_object(reply) else {
        warn!("Could not parse classifier reply");
        return ParsedReply::Fallback(SemanticJudgment::unparsable(text));
    };

    let is_on_topic = bool_field(&map, "is_islamic")
        .or_else(|| bool_field(&map, "is_on_topic"))
        .unwrap_or(false);

    ParsedReply::Parsed(SemanticJudgment {
        is_quality: bool_field(&map, "is_quality").unwrap_or(true),
        is_on_topic,
        confidence: f64_field(&map, "confidence").unwrap_or(0.5).clamp(0.0, 1.0),
        summary: str_field(&map, "summary")
            .filter(|s| !s.is_empty())
            .unwrap_or("Content analyzed")
            .to_string(),
    })
}

fn build_prompt(text: &str, prefix_chars: usize) -> String {
    let prefix: String = text.chars().take(prefix_chars).collect();
    format!(
        "Analyze this web content and determine:\n\n\
        1. Content Quality: Is this educational/informative content rather than gibberish, ads or navigation?\n\
        2. Islamic Content (true/false): Does this contain Islamic knowledge (Quran, Hadith, Islamic practices)?\n\
        3. Confidence (0-1): How confident are you in this analysis?\n\
        4. Brief Summary: What is this content about?\n\n\
        Content to analyze:\n{}\n\n\
        Respond in JSON format:\n\
        {{\n    \"is_quality\": true/false,\n    \"is_islamic\": true/false,\n    \"confidence\": 0.0-1.0,\n    \"summary\": \"brief description\"\n}}",
        prefix
    )
}

/// Classifier backed by an external completion model
#[derive(Debug, Clone)]
pub struct SemanticClassifier<M> {
    model: M,
    config: RelevanceConfig,
}

impl<M: CompletionModel> SemanticClassifier<M> {
    /// Create a classifier for the given model
    pub fn new(model: M, config: RelevanceConfig) -> Self {
        Self { model, config }
    }

    /// Judge a page of text.
    ///
    /// Never fails: a service error becomes the low-confidence
    /// `SemanticJudgment::unreachable` fallback.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn judge(&self, text: &str) -> ParsedReply<SemanticJudgment> {
        let prompt = build_prompt(text, self.config.classifier_prefix_chars);
        match complete_text(
            &self.model,
            CLASSIFIER_PREAMBLE,
            prompt,
            self.config.temperature,
            self.config.max_tokens,
        )
        .await
        {
            Ok(reply) => {
                debug!("Classifier reply: {}", reply);
                parse_judgment(&reply, text)
            }
            Err(e) => {
                warn!("Classifier call failed: {}", e);
                ParsedReply::Fallback(SemanticJudgment::unreachable(&e.to_string()))
            }
        }
    }
}
