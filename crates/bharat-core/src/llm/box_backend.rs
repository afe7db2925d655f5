//! BoxGenerationBackend -- object-safe dynamic dispatch wrapper for GenerationBackend.
//!
//! 1. Define an object-safe `GenerationBackendDyn` trait with boxed futures
//! 2. Blanket-impl `GenerationBackendDyn` for all `T: GenerationBackend`
//! 3. `BoxGenerationBackend` wraps `Box<dyn GenerationBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use bharat_types::llm::{GenerationRequest, LlmError};

use super::backend::GenerationBackend;

/// Object-safe version of [`GenerationBackend`] with boxed futures.
pub trait GenerationBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn has_credential(&self) -> bool;

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

    fn list_models_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, LlmError>> + Send + '_>>;
}

impl<T: GenerationBackend> GenerationBackendDyn for T {
    fn name(&self) -> &str {
        GenerationBackend::name(self)
    }

    fn has_credential(&self) -> bool {
        GenerationBackend::has_credential(self)
    }

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.generate(request))
    }

    fn list_models_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, LlmError>> + Send + '_>> {
        Box::pin(self.list_models())
    }
}

/// Type-erased generation backend.
///
/// Lets the application state hold the production Gemini backend while tests
/// substitute scripted backends, without making every service generic over
/// the backend type.
pub struct BoxGenerationBackend {
    inner: Box<dyn GenerationBackendDyn>,
}

impl BoxGenerationBackend {
    pub fn new<T: GenerationBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn has_credential(&self) -> bool {
        self.inner.has_credential()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.inner.generate_boxed(request).await
    }

    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        self.inner.list_models_boxed().await
    }
}
