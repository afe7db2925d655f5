//! Generation backend implementations.
//!
//! Provides the Gemini REST backend and a factory ([`create_backend`]) that
//! builds a [`BoxGenerationBackend`] from the upstream configuration.

pub mod gemini;

use secrecy::SecretString;

use bharat_core::llm::box_backend::BoxGenerationBackend;
use bharat_types::config::UpstreamConfig;
use bharat_types::llm::LlmError;

use self::gemini::GeminiBackend;

/// Create the production backend from config and the resolved API key.
///
/// A missing key is not an error here: the backend reports
/// `has_credential() == false` and chat requests are rejected with a
/// configuration error instead.
pub fn create_backend(
    config: &UpstreamConfig,
    api_key: Option<SecretString>,
) -> Result<BoxGenerationBackend, LlmError> {
    let backend = GeminiBackend::new(api_key, config.timeout())?.with_base_url(&config.base_url);
    Ok(BoxGenerationBackend::new(backend))
}
