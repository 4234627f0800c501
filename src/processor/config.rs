//! # Processor Configuration Module
//!
//! Configuration for the extraction stage, which turns crawled or uploaded
//! text into question/answer records.
//!
//! ## Key Components
//!
//! - `ProcessorConfig`: chunk budget, pacing and completion parameters
//! - `ProcessorConfigBuilder`: builder pattern implementation for easier configuration

use std::time::Duration;

/// Configuration for the processor
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum characters per chunk
    pub max_chunk_chars: usize,

    /// Pause after each chunk's extraction call
    pub chunk_delay: Duration,

    /// Sampling temperature for extraction calls
    pub temperature: f64,

    /// Token limit for each extraction reply
    pub max_tokens: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 8000,
            chunk_delay: Duration::from_secs(1),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// Builder for ProcessorConfig
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ProcessorConfig::default(),
        }
    }

    /// Set the chunk budget in characters
    pub fn max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.config.max_chunk_chars = max_chunk_chars;
        self
    }

    /// Set the pause after each chunk
    pub fn chunk_delay(mut self, chunk_delay: Duration) -> Self {
        self.config.chunk_delay = chunk_delay;
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the reply token limit
    pub fn max_tokens(mut self, max_tokens: u64) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ProcessorConfig {
        self.config
    }
}

impl ProcessorConfig {
    /// Create a new builder
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::new()
    }
}
