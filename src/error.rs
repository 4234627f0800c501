//! Error types for the curator crate

use thiserror::Error;

/// Result type for curator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for curator operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or invalid configuration, such as an absent API key
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),
}
