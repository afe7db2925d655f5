//! UpstreamClient -- the attempt loop around a [`BoxGenerationBackend`].
//!
//! Attempts are sequential. Each failed attempt is handed to the
//! [`RetryPolicy`], which either schedules a backoff sleep, surfaces the
//! error, or reports that the retry budget is spent.

use tracing::{Instrument, debug, info_span, warn};

use bharat_types::llm::{GenerationRequest, LlmError};

use super::box_backend::BoxGenerationBackend;
use super::retry::{AttemptState, RetryDecision, RetryPolicy};

/// Resilient client for the generative API.
///
/// Holds no session state and caches nothing; the only side effect of
/// [`UpstreamClient::generate`] is the outbound traffic itself.
pub struct UpstreamClient {
    backend: BoxGenerationBackend,
    policy: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(backend: BoxGenerationBackend, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn has_credential(&self) -> bool {
        self.backend.has_credential()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate text for `prompt`, retrying retryable failures with
    /// exponential backoff, for at most `max_retries + 1` attempts.
    pub async fn generate(
        &self,
        prompt: &str,
        model: &str,
        max_retries: u32,
    ) -> Result<String, LlmError> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            model: model.to_string(),
        };

        let span = info_span!(
            "gen_ai.generate",
            gen_ai.system = self.backend.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_retries = max_retries,
        );

        self.attempt_loop(&request, max_retries).instrument(span).await
    }

    async fn attempt_loop(
        &self,
        request: &GenerationRequest,
        max_retries: u32,
    ) -> Result<String, LlmError> {
        let mut state = AttemptState {
            attempt: 1,
            server_error_retries: 0,
        };

        loop {
            let error = match self.backend.generate(request).await {
                Ok(text) => {
                    debug!(attempt = state.attempt, chars = text.len(), "Generation succeeded");
                    return Ok(text);
                }
                Err(error) => error,
            };

            match self.policy.decide(&error, state, max_retries) {
                RetryDecision::Retry { delay } => {
                    warn!(
                        attempt = state.attempt,
                        kind = %error.kind(),
                        delay_ms = delay.as_millis() as u64,
                        "Upstream attempt failed, backing off"
                    );
                    if matches!(error, LlmError::UpstreamServerError { .. }) {
                        state.server_error_retries += 1;
                    }
                    tokio::time::sleep(delay).await;
                    state.attempt += 1;
                }
                RetryDecision::Fail => {
                    warn!(attempt = state.attempt, kind = %error.kind(), error = %error, "Upstream call failed");
                    return Err(error);
                }
                RetryDecision::Exhausted => {
                    warn!(attempts = state.attempt, kind = %error.kind(), "Upstream retries exhausted");
                    return Err(LlmError::RetriesExhausted {
                        attempts: state.attempt,
                        last: Box::new(error),
                    });
                }
            }
        }
    }

    /// Check the credential with a single listing call. Never retried.
    pub async fn validate_credentials(&self) -> Result<Vec<String>, LlmError> {
        let span = info_span!("gen_ai.list_models", gen_ai.system = self.backend.name());
        self.backend.list_models().instrument(span).await
    }
}
