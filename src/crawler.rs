//! # Website Crawler Module
//!
//! Crawls a site from one seed URL, keeps the pages worth keeping and writes
//! their combined text to an output sink. The combined text is the input of
//! the extraction stage in `processor`.
//!
//! ## Key Components
//!
//! - `Crawler`: owns the HTTP session, the relevance classifier and the sink
//! - `CrawlRequest` / `CrawlerConfig`: per-call parameters and long-lived settings
//! - `CrawlReport`: success flag, summary, combined text, statistics and skip log
//! - `OutputSink`: where artifacts go (`FileSink`, `MemorySink`)
//!
//! ## Flow
//!
//! Pages are processed one at a time in frontier order: fetch, parse, extract,
//! discover same-site links, classify, then accept or skip. A failure at one
//! URL only ever skips that URL.

mod config;
pub mod content_extraction;
mod error;
pub mod fetcher;
pub mod frontier;
pub mod links;
pub mod pipeline;
pub mod storage;

pub use config::{CrawlRequest, CrawlerConfig, CrawlerConfigBuilder};
pub use content_extraction::{ExtractedPage, clean_text};
pub use error::CrawlError;
pub use fetcher::{FetchOutcome, FetchResult, Fetcher, StatusClass, normalize_url};
pub use pipeline::{CrawlReport, CrawlStats, Crawler, SkipReason, SkippedPage, artifact_name};
pub use storage::{ArtifactHandle, ArtifactInfo, FileSink, MemorySink, OutputSink, StorageError};
