//! # Relevance Classification Module
//!
//! Decides whether extracted page text is worth keeping and whether it is on
//! topic. Two independent signals feed the decision:
//!
//! - the heuristic signal: keyword density plus scripture and hadith
//!   reference patterns, computed locally and deterministically
//! - the semantic signal: an optional judgment from an external model
//!
//! ## Combination
//!
//! - Topicality is the OR of both signals.
//! - Quality rejection needs the semantic signal to report low quality with a
//!   confidence above the configured threshold. Missing, failed or uncertain
//!   classifier calls never reject a page.

mod config;
pub mod heuristic;
pub mod semantic;

pub use config::{RelevanceConfig, RelevanceConfigBuilder};
pub use heuristic::{HeuristicSignal, score_text};
pub use semantic::{SemanticClassifier, SemanticJudgment, parse_judgment};

use rig::completion::CompletionModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::reply::ParsedReply;

/// Confidence reported when only the heuristic signal ran
const HEURISTIC_ONLY_CONFIDENCE: f64 = 0.5;

/// Combined relevance decision for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceVerdict {
    /// Substantive content rather than boilerplate
    pub is_quality: bool,

    /// On topic according to either signal
    pub is_on_topic: bool,

    /// Confidence of the semantic signal, or 0.5 when it did not run
    pub confidence: f64,

    /// Human-readable rationale, the classifier summary when available
    pub rationale: String,

    /// Keyword hits per hundred words
    pub heuristic_score: f64,

    /// Scripture citation matches
    pub quran_references: usize,

    /// Hadith collection matches
    pub hadith_references: usize,

    /// The semantic judgment, when the classifier ran
    pub semantic: Option<SemanticJudgment>,

    /// Whether the semantic judgment is a fallback substitute
    pub semantic_fallback: bool,

    /// Whether the quality gate rejects the page
    pub rejected_for_quality: bool,
}

impl RelevanceVerdict {
    /// Combine the heuristic signal with an optional semantic judgment
    pub fn combine(
        heuristic: &HeuristicSignal,
        semantic: Option<ParsedReply<SemanticJudgment>>,
        config: &RelevanceConfig,
    ) -> Self {
        let semantic_fallback = semantic.as_ref().is_some_and(ParsedReply::is_fallback);
        let semantic = semantic.map(ParsedReply::into_inner);

        let is_on_topic =
            heuristic.is_on_topic || semantic.as_ref().is_some_and(|s| s.is_on_topic);
        let rejected_for_quality = semantic
            .as_ref()
            .is_some_and(|s| !s.is_quality && s.confidence > config.quality_reject_confidence);

        let (is_quality, confidence, rationale) = match &semantic {
            Some(s) => (s.is_quality, s.confidence, s.summary.clone()),
            None => (
                true,
                HEURISTIC_ONLY_CONFIDENCE,
                format!(
                    "Heuristic only: {} keyword hits in {} words",
                    heuristic.keyword_hits, heuristic.word_count
                ),
            ),
        };

        Self {
            is_quality,
            is_on_topic,
            confidence,
            rationale,
            heuristic_score: heuristic.keyword_ratio,
            quran_references: heuristic.quran_references,
            hadith_references: heuristic.hadith_references,
            semantic,
            semantic_fallback,
            rejected_for_quality,
        }
    }

    /// Whether the page survives the quality gate
    pub fn passes_quality_gate(&self) -> bool {
        !self.rejected_for_quality
    }
}

/// Relevance classifier with an optional semantic model
#[derive(Debug, Clone)]
pub struct RelevanceClassifier<M> {
    semantic: Option<SemanticClassifier<M>>,
    config: RelevanceConfig,
}

impl<M: CompletionModel> RelevanceClassifier<M> {
    /// Create a classifier; without a model only the heuristic signal runs
    pub fn new(model: Option<M>, config: RelevanceConfig) -> Self {
        Self {
            semantic: model.map(|m| SemanticClassifier::new(m, config.clone())),
            config,
        }
    }

    /// Whether a semantic model is available
    pub fn has_model(&self) -> bool {
        self.semantic.is_some()
    }

    /// The configuration in use
    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    /// Classify text; the semantic signal runs only when `use_model` is set
    /// and a model is available. Never fails.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn classify(&self, text: &str, use_model: bool) -> RelevanceVerdict {
        let heuristic = score_text(text, self.config.topic_ratio_threshold);

        let semantic = match (&self.semantic, use_model) {
            (Some(classifier), true) => Some(classifier.judge(text).await),
            _ => None,
        };

        let verdict = RelevanceVerdict::combine(&heuristic, semantic, &self.config);
        debug!(
            on_topic = verdict.is_on_topic,
            quality = verdict.is_quality,
            confidence = verdict.confidence,
            "Classified text"
        );
        verdict
    }
}
