//! Question/answer records and their fine-tuning form

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::processor::error::ProcessError;
use crate::reply::parse_json_array;

/// Category used when a record does not name one
pub const DEFAULT_CATEGORY: &str = "General";

/// System message of every training example
pub const TRAINING_SYSTEM_PROMPT: &str = "You are an Islamic scholar assistant specializing in Quran and the 6 Sahih Hadith collections (Bukhari, Muslim, Abu Dawood, Tirmidhi, Nasa'i, Ibn Majah). Always provide exact verse/hadith references. For non-Islamic questions, politely indicate you can search for general information.";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A sourced question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QARecord {
    pub question: String,
    pub answer: String,
    /// Work the answer comes from, e.g. "Sahih al-Bukhari"
    pub source: String,
    /// Location within the source, e.g. "2:255" or a hadith number
    pub reference: String,
    #[serde(default = "default_category")]
    pub category: String,
}

/// One chat message of a training example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Chat-format fine-tuning example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub messages: Vec<ChatMessage>,
    pub category: String,
    /// RFC 3339 creation time
    pub created_at: String,
}

impl QARecord {
    /// A record in the default category
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        source: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            source: source.into(),
            reference: reference.into(),
            category: default_category(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Question, answer, source and reference are all non-blank
    pub fn is_valid(&self) -> bool {
        [&self.question, &self.answer, &self.source, &self.reference]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// Convert into a system/user/assistant training example
    pub fn to_training_example(&self) -> TrainingExample {
        TrainingExample {
            messages: vec![
                ChatMessage::new("system", TRAINING_SYSTEM_PROMPT),
                ChatMessage::new("user", self.question.clone()),
                ChatMessage::new(
                    "assistant",
                    format!(
                        "{}\n\n**Reference:** {} {}",
                        self.answer, self.source, self.reference
                    ),
                ),
            ],
            category: self.category.clone(),
            created_at: Local::now().to_rfc3339(),
        }
    }

    /// Build a record from a loosely-shaped JSON object.
    ///
    /// Strings are trimmed, numbers are accepted as text (a reference is
    /// often a bare number) and a blank category becomes the default.
    fn from_json(map: &Map<String, Value>) -> Self {
        let field = |key: &str| match map.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let category = field("category");
        Self {
            question: field("question"),
            answer: field("answer"),
            source: field("source"),
            reference: field("reference"),
            category: if category.is_empty() {
                default_category()
            } else {
                category
            },
        }
    }
}

/// Parse a JSON array of record-shaped objects, keeping only valid records.
///
/// The array may be wrapped in code fences or surrounded by prose. Fails
/// when no JSON array can be found at all.
pub fn records_from_json(json: &str) -> Result<Vec<QARecord>, ProcessError> {
    let values = parse_json_array(json)
        .ok_or_else(|| ProcessError::ReplyParse("no JSON array found".to_string()))?;

    Ok(values
        .iter()
        .filter_map(Value::as_object)
        .map(QARecord::from_json)
        .filter(QARecord::is_valid)
        .collect())
}
