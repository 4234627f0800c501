//! # Curator - Training Corpus Curation from the Web
//!
//! Crawls web pages, keeps the ones that are substantive and on topic, and
//! turns the kept text into sourced question/answer records for fine-tuning a
//! chat model.
//!
//! ## Features
//!
//! - Sequential same-site crawling with a page budget and polite delays
//! - Content extraction with boilerplate removal and parser fallbacks
//! - Hybrid relevance classification: keyword and citation heuristics plus
//!   an optional model-assisted judgment that fails open
//! - Chunked record extraction that tolerates malformed replies
//! - Pluggable output sinks for crawl artifacts
//!
//! ## Example
//!
//! ```rust,no_run
//! use curator::crawler::{CrawlRequest, Crawler, CrawlerConfig, FileSink};
//! use curator::model::openai_from_env;
//! use curator::processor::{Extractor, ProcessorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = openai_from_env()?;
//!     let crawler = Crawler::new(
//!         CrawlerConfig::default(),
//!         Some(model.clone()),
//!         FileSink::default(),
//!     )?;
//!
//!     let request = CrawlRequest::new("https://example.com/articles")
//!         .page_budget(5)
//!         .topic_only(true);
//!     let report = crawler.crawl(&request).await;
//!     println!("{}", report.message);
//!
//!     if report.success {
//!         let extractor = Extractor::new(model, ProcessorConfig::default());
//!         let outcome = extractor.extract_records(&report.content, true).await;
//!         println!("{}", outcome.message);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod model;
pub mod reply;

pub mod crawler;
pub mod processor;
pub mod relevance;

pub use error::{Error, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::crawler::{CrawlReport, CrawlRequest, Crawler, CrawlerConfig, OutputSink};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::processor::{ExtractionOutcome, Extractor, ProcessorConfig, QARecord};
    pub use crate::relevance::{RelevanceClassifier, RelevanceConfig, RelevanceVerdict};
}
