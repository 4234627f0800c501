//! # Crawler Configuration Module
//!
//! Configuration for the fetch/extract/classify loop, using a builder pattern
//! for flexible configuration. `CrawlRequest` holds the per-call parameters,
//! `CrawlerConfig` the long-lived settings shared by every crawl.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: session headers, timeouts, pacing and extraction limits
//! - `CrawlerConfigBuilder`: builder pattern implementation
//! - `CrawlRequest`: seed URL, page budget and filter flags for one crawl

use std::time::Duration;

use crate::relevance::RelevanceConfig;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for a single page request
    pub request_timeout: Duration,

    /// Pause after every page whose fetch was attempted
    pub page_delay: Duration,

    /// Pause between seeds in a multi-seed crawl
    pub seed_delay: Duration,

    /// Maximum redirects followed per request
    pub max_redirects: usize,

    /// Text blocks must be longer than this many characters
    pub min_block_chars: usize,

    /// Extracted page text must be longer than this many characters
    pub min_page_chars: usize,

    /// Anchors inspected per page during link discovery
    pub max_links_per_page: usize,

    /// User agent sent with every request
    pub user_agent: String,

    /// Accept header sent with every request
    pub accept: String,

    /// Accept-Language header sent with every request
    pub accept_language: String,

    /// CSS selectors for the primary content region, most specific first
    pub content_selectors: Vec<String>,

    /// CSS selectors for elements removed before extraction
    pub exclude_selectors: Vec<String>,

    /// Relevance thresholds
    pub relevance: RelevanceConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            page_delay: Duration::from_secs(1),
            seed_delay: Duration::from_secs(2),
            max_redirects: 10,
            min_block_chars: 15,
            min_page_chars: 100,
            max_links_per_page: 20,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.9,ar;q=0.8".to_string(),
            content_selectors: [
                "main",
                "article",
                ".content",
                ".main-content",
                ".post-content",
                ".entry-content",
                "#content",
                "#main",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude_selectors: [
                "script", "style", "noscript", "nav", "header", "footer", "aside", "form",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            relevance: RelevanceConfig::default(),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the pause after each page
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.config.page_delay = delay;
        self
    }

    /// Set the pause between seeds
    pub fn seed_delay(mut self, delay: Duration) -> Self {
        self.config.seed_delay = delay;
        self
    }

    /// Set the minimum text block length
    pub fn min_block_chars(mut self, chars: usize) -> Self {
        self.config.min_block_chars = chars;
        self
    }

    /// Set the minimum page text length
    pub fn min_page_chars(mut self, chars: usize) -> Self {
        self.config.min_page_chars = chars;
        self
    }

    /// Set how many anchors are inspected per page
    pub fn max_links_per_page(mut self, links: usize) -> Self {
        self.config.max_links_per_page = links;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the CSS selectors for the content region
    pub fn content_selectors(mut self, content_selectors: Vec<String>) -> Self {
        self.config.content_selectors = content_selectors;
        self
    }

    /// Set the CSS selectors for elements to exclude
    pub fn exclude_selectors(mut self, exclude_selectors: Vec<String>) -> Self {
        self.config.exclude_selectors = exclude_selectors;
        self
    }

    /// Set the relevance thresholds
    pub fn relevance(mut self, relevance: RelevanceConfig) -> Self {
        self.config.relevance = relevance;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }
}

/// Parameters of a single crawl. Immutable once the crawl starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Seed URL; a missing scheme defaults to https
    pub seed_url: String,

    /// Maximum number of pages, at least 1
    pub page_budget: usize,

    /// Keep only pages that are on topic
    pub topic_only: bool,

    /// Consult the semantic classifier when one is configured
    pub classifier_enabled: bool,
}

impl CrawlRequest {
    /// A single-page request with the classifier enabled
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            page_budget: 1,
            topic_only: false,
            classifier_enabled: true,
        }
    }

    /// Set the page budget
    pub fn page_budget(mut self, pages: usize) -> Self {
        self.page_budget = pages;
        self
    }

    /// Keep only on-topic pages
    pub fn topic_only(mut self, topic_only: bool) -> Self {
        self.topic_only = topic_only;
        self
    }

    /// Enable or disable the semantic classifier
    pub fn classifier_enabled(mut self, enabled: bool) -> Self {
        self.classifier_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawler_config_builder() {
        let config = CrawlerConfig::builder()
            .page_delay(Duration::ZERO)
            .min_page_chars(50)
            .user_agent("test-agent")
            .build();

        assert_eq!(config.page_delay, Duration::ZERO);
        assert_eq!(config.min_page_chars, 50);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.content_selectors.first().map(String::as_str), Some("main"));
    }

    #[test]
    fn test_crawl_request_defaults() {
        let request = CrawlRequest::new("example.com").page_budget(3).topic_only(true);

        assert_eq!(request.seed_url, "example.com");
        assert_eq!(request.page_budget, 3);
        assert!(request.topic_only);
        assert!(request.classifier_enabled);
    }
}
