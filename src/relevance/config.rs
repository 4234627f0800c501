//! Thresholds and request settings for relevance classification

/// Configuration for the relevance classifier
#[derive(Debug, Clone)]
pub struct RelevanceConfig {
    /// Keyword hits per hundred words above which text counts as on topic
    pub topic_ratio_threshold: f64,

    /// Classifier confidence above which a low-quality call rejects a page
    pub quality_reject_confidence: f64,

    /// Number of characters of page text sent to the classifier
    pub classifier_prefix_chars: usize,

    /// Sampling temperature for classifier requests
    pub temperature: f64,

    /// Reply token limit for classifier requests
    pub max_tokens: u64,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            topic_ratio_threshold: 0.5,
            quality_reject_confidence: 0.7,
            classifier_prefix_chars: 2000,
            temperature: 0.3,
            max_tokens: 200,
        }
    }
}

/// Builder for RelevanceConfig
#[derive(Debug, Default)]
pub struct RelevanceConfigBuilder {
    config: RelevanceConfig,
}

impl RelevanceConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: RelevanceConfig::default(),
        }
    }

    /// Set the keyword ratio threshold
    pub fn topic_ratio_threshold(mut self, threshold: f64) -> Self {
        self.config.topic_ratio_threshold = threshold;
        self
    }

    /// Set the confidence needed for a quality rejection
    pub fn quality_reject_confidence(mut self, confidence: f64) -> Self {
        self.config.quality_reject_confidence = confidence;
        self
    }

    /// Set how much text the classifier sees
    pub fn classifier_prefix_chars(mut self, chars: usize) -> Self {
        self.config.classifier_prefix_chars = chars;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RelevanceConfig {
        self.config
    }
}

impl RelevanceConfig {
    /// Create a new builder
    pub fn builder() -> RelevanceConfigBuilder {
        RelevanceConfigBuilder::new()
    }
}
