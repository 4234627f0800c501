//! Keyword and reference-pattern scoring.
//!
//! Pure and deterministic: the same text always produces the same signal.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Domain vocabulary counted by case-insensitive substring match
pub const TOPIC_KEYWORDS: &[&str] = &[
    // Names and core terms
    "allah", "muhammad", "quran", "qur'an", "hadith", "hadis", "sunnah",
    "islam", "muslim", "islamic", "prophet", "messenger",
    // Pillars and belief
    "salah", "prayer", "zakat", "charity", "hajj", "pilgrimage", "sawm", "fasting",
    "shahada", "faith", "iman", "tawhid", "shirk",
    // Collections
    "bukhari", "muslim", "abu dawood", "tirmidhi", "nasa'i", "ibn majah",
    "sahih", "sunan", "jami", "musnad",
    // Scripture structure
    "surah", "ayah", "verse", "chapter", "revelation",
    // Practice and law
    "mosque", "masjid", "imam", "khutbah", "dua", "dhikr",
    "halal", "haram", "makruh", "mustahab", "fiqh", "sharia",
];

/// Verse citations (`2:255`), named surahs and numbered chapters
static QURAN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\b\d{1,3}:\d{1,3}\b", r"surah\s+[\w\-]+", r"chapter\s+\d+"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Named hadith collections
static HADITH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"sahih\s+(bukhari|muslim)",
        r"sunan\s+(abu\s+dawood|tirmidhi|nasa'?i|ibn\s+majah)",
        r"jami\s+tirmidhi",
        r"musnad\s+ahmad",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Result of the heuristic scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicSignal {
    /// Whether the heuristic considers the text on topic
    pub is_on_topic: bool,

    /// Keyword hits per hundred words
    pub keyword_ratio: f64,

    /// Total keyword hits
    pub keyword_hits: usize,

    /// Whitespace-separated word count
    pub word_count: usize,

    /// Scripture citation matches
    pub quran_references: usize,

    /// Hadith collection matches
    pub hadith_references: usize,
}

/// Score text against the domain vocabulary and reference patterns.
///
/// Text is on topic when the keyword ratio exceeds `ratio_threshold` or when
/// either reference family matched at least once.
pub fn score_text(text: &str, ratio_threshold: f64) -> HeuristicSignal {
    let lower = text.to_lowercase();
    let word_count = text.split_whitespace().count();

    let keyword_hits: usize = TOPIC_KEYWORDS
        .iter()
        .map(|keyword| lower.matches(keyword).count())
        .sum();
    let keyword_ratio = keyword_hits as f64 / word_count.max(1) as f64 * 100.0;

    let quran_references = count_matches(&QURAN_PATTERNS, &lower);
    let hadith_references = count_matches(&HADITH_PATTERNS, &lower);

    HeuristicSignal {
        is_on_topic: keyword_ratio > ratio_threshold || quran_references > 0 || hadith_references > 0,
        keyword_ratio,
        keyword_hits,
        word_count,
        quran_references,
        hadith_references,
    }
}

fn count_matches(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().map(|p| p.find_iter(text).count()).sum()
}
