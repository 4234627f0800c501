//! # Language Model Client Module
//!
//! The classifier and the extraction chunker talk to an external
//! text-understanding service through rig's `CompletionModel` trait. This
//! module builds the production model and offers a small helper that turns a
//! completion response into plain text.
//!
//! ## Key Components
//!
//! - `RateLimitedCompletionModel`: wraps any completion model with a quota limiter
//! - `MockCompletionModel`: scripted replies for tests
//! - `openai_from_env`: the production model, keyed from `OPENAI_API_KEY`
//! - `complete_text`: send one preamble + prompt and collect the text reply

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use rig::{
    completion::{CompletionError, CompletionModel},
    message::AssistantContent,
    providers::openai,
};
use tracing::debug;

use crate::error::Error;

pub mod mock_model;
pub mod ratelimited_completion;

pub use mock_model::MockCompletionModel;
pub use ratelimited_completion::RateLimitedCompletionModel;

/// Environment variable holding the API key for the production model
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Model used for classification and extraction
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Completion requests allowed per minute before the limiter waits
const REQUESTS_PER_MINUTE: u32 = 500;

/// The production completion model
pub type OpenAiCompletionModel = RateLimitedCompletionModel<openai::CompletionModel>;

/// Build the production completion model from `OPENAI_API_KEY`
pub fn openai_from_env() -> Result<OpenAiCompletionModel, Error> {
    let api_key = std::env::var(API_KEY_ENV)
        .map_err(|_| Error::Config(format!("{} environment variable must be set", API_KEY_ENV)))?;
    Ok(openai_with_key(&api_key, DEFAULT_MODEL))
}

/// Build a rate-limited OpenAI completion model for the given key and model name
pub fn openai_with_key(api_key: &str, model: &str) -> OpenAiCompletionModel {
    let client = openai::Client::new(api_key);
    let quota = NonZeroU32::new(REQUESTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN);
    RateLimitedCompletionModel::new(
        client.completion_model(model),
        RateLimiter::direct(Quota::per_minute(quota)),
    )
}

/// Send a single prompt with a system preamble and return the text of the reply.
///
/// Non-text content in the reply (tool calls) is ignored.
pub async fn complete_text<M: CompletionModel>(
    model: &M,
    preamble: &str,
    prompt: String,
    temperature: f64,
    max_tokens: u64,
) -> Result<String, CompletionError> {
    let response = model
        .completion_request(prompt)
        .preamble(preamble.to_string())
        .temperature(temperature)
        .max_tokens(max_tokens)
        .send()
        .await?;

    let text = response
        .choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join("\n");

    debug!("Model replied with {} characters", text.len());
    Ok(text)
}
