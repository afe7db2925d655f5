//! Upstream generation types for Bharat Guide.
//!
//! These types model a single-shot text generation call: the request, the
//! static model catalog, and the classified error taxonomy that drives retry
//! decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model used when neither the request nor the config names one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";

/// Known model ids and their labels, in the order they are offered to clients.
pub const MODEL_CATALOG: &[(&str, &str)] = &[
    ("gemini-1.5-pro-latest", "Gemini 1.5 Pro (Recommended)"),
    ("gemini-1.5-flash", "Gemini 1.5 Flash (Faster)"),
    ("gemini-pro-vision", "Gemini Pro Vision (Image + Text)"),
    ("gemini-1.0-pro-vision-latest", "Gemini 1.0 Pro Vision"),
];

/// Whether `model` is safe to splice into the upstream URL path.
pub fn is_valid_model_id(model: &str) -> bool {
    !model.is_empty()
        && model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// One flattened prompt destined for a single completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
}

/// Closed set of error kinds used to decide retry and surface behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    Unauthorized,
    Forbidden,
    InvalidRequest,
    UpstreamServerError,
    Timeout,
    ConnectionError,
    MalformedResponse,
    EmptyGeneration,
    RetriesExhausted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::UpstreamServerError => "upstream_server_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::EmptyGeneration => "empty_generation",
            ErrorKind::RetriesExhausted => "retries_exhausted",
        };
        f.write_str(s)
    }
}

/// Classified outcome of a failed upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("credential rejected: {0}")]
    Unauthorized(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("invalid request (HTTP {status}): {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("upstream server error (HTTP {status}): {message}")]
    UpstreamServerError { status: u16, message: String },

    #[error("upstream request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("failed to parse response: {0}")]
    MalformedResponse(String),

    #[error("no text was generated in the response")]
    EmptyGeneration,

    #[error("maximum retries reached after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<LlmError> },
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::RateLimited(_) => ErrorKind::RateLimited,
            LlmError::Unauthorized(_) => ErrorKind::Unauthorized,
            LlmError::Forbidden(_) => ErrorKind::Forbidden,
            LlmError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            LlmError::UpstreamServerError { .. } => ErrorKind::UpstreamServerError,
            LlmError::Timeout => ErrorKind::Timeout,
            LlmError::Connection(_) => ErrorKind::ConnectionError,
            LlmError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            LlmError::EmptyGeneration => ErrorKind::EmptyGeneration,
            LlmError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
        }
    }

    /// Transport failures and rate limiting are worth another attempt.
    ///
    /// Server errors are handled separately by the retry policy, which
    /// allows at most one extra attempt for them.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited(_) | LlmError::Timeout | LlmError::Connection(_)
        )
    }

    /// The innermost error, looking through `RetriesExhausted`.
    pub fn root(&self) -> &LlmError {
        match self {
            LlmError::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            LlmError::RetriesExhausted { last, .. }
                if matches!(last.as_ref(), LlmError::RateLimited(_)) =>
            {
                "Maximum retries reached due to rate limiting".to_string()
            }
            LlmError::RetriesExhausted { last, .. } => {
                format!("Maximum retries reached: {}", last.user_message())
            }
            LlmError::Unauthorized(msg)
            | LlmError::Forbidden(msg)
            | LlmError::RateLimited(msg) => msg.clone(),
            LlmError::InvalidRequest { message, .. }
            | LlmError::UpstreamServerError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_validation() {
        assert!(is_valid_model_id("gemini-1.5-pro-latest"));
        assert!(is_valid_model_id("gemini_2.0"));
        assert!(!is_valid_model_id(""));
        assert!(!is_valid_model_id("../models"));
        assert!(!is_valid_model_id("gemini?key=x"));
    }

    #[test]
    fn catalog_contains_default_model() {
        assert!(MODEL_CATALOG.iter().any(|(id, _)| *id == DEFAULT_MODEL));
    }

    #[test]
    fn retryable_classification() {
        assert!(LlmError::RateLimited("slow down".into()).is_retryable());
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::Connection("reset".into()).is_retryable());
        assert!(!LlmError::Unauthorized("bad key".into()).is_retryable());
        assert!(!LlmError::EmptyGeneration.is_retryable());
        assert!(
            !LlmError::UpstreamServerError {
                status: 503,
                message: "down".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn exhausted_rate_limit_has_friendly_message() {
        let err = LlmError::RetriesExhausted {
            attempts: 4,
            last: Box::new(LlmError::RateLimited("quota".into())),
        };
        assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
        assert_eq!(err.root().kind(), ErrorKind::RateLimited);
        assert_eq!(err.user_message(), "Maximum retries reached due to rate limiting");
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::EmptyGeneration).unwrap();
        assert_eq!(json, "\"empty_generation\"");
        assert_eq!(ErrorKind::ConnectionError.to_string(), "connection_error");
    }
}
