use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::completion::{self, CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{Instrument, debug_span, info_span};

/// Raw provider response carried through the limiter
pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

/// A completion model that waits on a shared quota before every request
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<completion::CompletionResponse<Self::Response>, CompletionError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        let response = self
            .model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await;
        response.map(|response| CompletionResponse {
            choice: response.choice,
            raw_response: RateLimitResponse {
                response: response.raw_response,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use governor::{Quota, RateLimiter};

    use super::*;
    use crate::model::{MockCompletionModel, complete_text};

    #[tokio::test]
    async fn test_passes_reply_through_limiter() {
        let mock = MockCompletionModel::new();
        mock.push_text("{\"ok\": true}").await;

        let limiter = RateLimiter::direct(Quota::per_minute(NonZeroU32::new(60).unwrap()));
        let model = RateLimitedCompletionModel::new(mock.clone(), limiter);

        let text = complete_text(&model, "system", "prompt".to_string(), 0.0, 16)
            .await
            .unwrap();
        assert_eq!(text, "{\"ok\": true}");
        assert_eq!(mock.calls(), 1);
    }
}
