//! Retry policy for upstream generation calls.
//!
//! Retry decisions are a pure function of the classified error and the
//! attempt bookkeeping; the attempt loop in [`super::client`] only sleeps and
//! re-sends.

use std::time::Duration;

use bharat_types::config::UpstreamConfig;
use bharat_types::llm::LlmError;

/// What the attempt loop should do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then attempt again.
    Retry { delay: Duration },
    /// Surface the error as-is.
    Fail,
    /// The error was retryable but no attempts remain.
    Exhausted,
}

/// Attempt bookkeeping for one `generate` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptState {
    /// 1-based index of the attempt that just failed.
    pub attempt: u32,
    /// How many retries were already spent on upstream 5xx responses.
    pub server_error_retries: u32,
}

/// Exponential backoff over a classified-error whitelist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry `i` (1-based) waits `2^i` units.
    pub backoff_unit: Duration,
    /// Allow a single extra attempt after an upstream 5xx.
    pub retry_server_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff_unit: Duration::from_secs(1),
            retry_server_errors: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            backoff_unit: config.backoff_unit(),
            retry_server_errors: config.retry_server_errors,
        }
    }

    /// Wait before retry number `retry_index` (1-based): `2^retry_index` units.
    pub fn backoff(&self, retry_index: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(2u32.saturating_pow(retry_index))
    }

    /// Decide what happens after `error` ended attempt `state.attempt`.
    ///
    /// At most `max_retries + 1` attempts are ever made.
    pub fn decide(&self, error: &LlmError, state: AttemptState, max_retries: u32) -> RetryDecision {
        let server_retry_allowed = matches!(error, LlmError::UpstreamServerError { .. })
            && self.retry_server_errors
            && state.server_error_retries == 0;

        if !error.is_retryable() && !server_retry_allowed {
            return RetryDecision::Fail;
        }

        if state.attempt > max_retries {
            return RetryDecision::Exhausted;
        }

        RetryDecision::Retry {
            delay: self.backoff(state.attempt),
        }
    }

    /// Total time spent waiting if every one of `max_retries` retries is used.
    pub fn total_backoff(&self, max_retries: u32) -> Duration {
        (1..=max_retries).map(|i| self.backoff(i)).sum()
    }
}
