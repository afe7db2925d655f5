//! GenerationBackend trait definition.
//!
//! This is the seam between retry/orchestration logic (here in core) and the
//! concrete HTTP client (in bharat-infra). A backend performs exactly one
//! outbound call per invocation and classifies its outcome; it never retries.

use std::future::Future;

use bharat_types::llm::{GenerationRequest, LlmError};

/// Trait for generative text backends (the Gemini REST API in production).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Whether a usable credential is configured.
    ///
    /// Placeholder values count as absent.
    fn has_credential(&self) -> bool;

    /// Send one generation call and return the concatenated generated text.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Lightweight credential check: list the models visible to the key.
    fn list_models(&self) -> impl Future<Output = Result<Vec<String>, LlmError>> + Send;
}
