//! # Mock Completion Model for Testing
//!
//! Provides a `MockCompletionModel` that implements the `CompletionModel` trait
//! for use in tests. Replies are scripted as a queue of texts or errors, so a
//! test can make one call fail and the next succeed without any network.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// A scripted reply: text on success, message on failure
type Scripted = Result<String, String>;

/// A mock completion model for testing purposes.
///
/// Each call pops the next scripted reply. Once the queue is empty every call
/// returns an empty text, or fails after `set_default_error`.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    default_error: Arc<Mutex<Option<String>>>,
    preambles: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a new mock model with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful text reply.
    pub async fn push_text(&self, text: &str) {
        self.replies.lock().await.push_back(Ok(text.to_string()));
    }

    /// Queue a failed call.
    pub async fn push_error(&self, message: &str) {
        self.replies.lock().await.push_back(Err(message.to_string()));
    }

    /// Make every call after the queue is drained fail.
    pub async fn set_default_error(&self, message: &str) {
        *self.default_error.lock().await = Some(message.to_string());
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Preambles seen by the model, in call order.
    pub async fn preambles(&self) -> Vec<String> {
        self.preambles.lock().await.clone()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.preambles
            .lock()
            .await
            .push(completion_request.preamble.clone().unwrap_or_default());

        let scripted = match self.replies.lock().await.pop_front() {
            Some(reply) => reply,
            None => match self.default_error.lock().await.clone() {
                Some(message) => Err(message),
                None => Ok(String::new()),
            },
        };

        match scripted {
            Ok(text) => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text(&text)),
                raw_response: text,
            }),
            Err(message) => Err(CompletionError::ProviderError(message)),
        }
    }
}
