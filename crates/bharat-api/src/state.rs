//! Application state wiring the chat service together.
//!
//! AppState holds the concrete service instance used by both CLI and REST
//! API. `ChatService` is generic over its session store, but AppState pins it
//! to the in-memory implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use bharat_core::chat::service::{ChatService, ChatSettings};
use bharat_core::chat::store::InMemorySessionStore;
use bharat_core::llm::box_backend::BoxGenerationBackend;
use bharat_core::llm::client::UpstreamClient;
use bharat_core::llm::retry::RetryPolicy;
use bharat_core::prompt::{PersonaTemplate, PromptBuilder};
use bharat_infra::config::LoadedConfig;
use bharat_infra::llm::create_backend;
use bharat_types::config::AppConfig;

pub type ConcreteChatService = ChatService<InMemorySessionStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire the production Gemini backend from loaded configuration.
    pub fn init(loaded: LoadedConfig) -> anyhow::Result<Self> {
        let backend = create_backend(&loaded.config.upstream, loaded.api_key)?;
        if !backend.has_credential() {
            tracing::warn!(
                env = %loaded.config.upstream.api_key_env,
                "API key is not configured; chat requests will fail until it is set"
            );
        }
        Ok(Self::from_parts(loaded.config, backend, loaded.persona))
    }

    /// Wire state around an arbitrary backend.
    pub fn from_parts(
        config: AppConfig,
        backend: BoxGenerationBackend,
        persona: PersonaTemplate,
    ) -> Self {
        let upstream = UpstreamClient::new(backend, RetryPolicy::from_config(&config.upstream));
        let chat_service = ChatService::new(
            InMemorySessionStore::new(config.chat.max_history),
            upstream,
            PromptBuilder::new(persona),
            ChatSettings::from_config(&config.chat, &config.upstream),
        );

        Self {
            chat_service: Arc::new(chat_service),
            config: Arc::new(config),
        }
    }

    /// Start the idle-session sweeper. Returns `None` when expiry is disabled.
    pub fn spawn_session_sweeper(&self) -> Option<JoinHandle<()>> {
        let max_idle = self.config.chat.session_idle_timeout()?;
        let every = Duration::from_secs(self.config.chat.sweep_interval_secs.max(1));
        let service = Arc::clone(&self.chat_service);

        tracing::info!(
            idle_timeout_secs = max_idle.as_secs(),
            sweep_interval_secs = every.as_secs(),
            "Session sweeper started"
        );

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = service.expire_idle(max_idle).await {
                    tracing::warn!(error = %e, "Session sweep failed");
                }
            }
        }))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use bharat_core::llm::backend::GenerationBackend;
    use bharat_types::llm::{GenerationRequest, LlmError};

    use super::*;

    /// Backend answering from a fixed outcome and recording prompts.
    pub struct StubBackend {
        pub credential: bool,
        pub outcome: Result<String, LlmError>,
        pub prompts: Arc<Mutex<Vec<String>>>,
    }

    impl GenerationBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.outcome.clone()
        }

        async fn list_models(&self) -> Result<Vec<String>, LlmError> {
            if self.credential {
                Ok(vec!["models/gemini-1.5-pro-latest".to_string()])
            } else {
                Err(LlmError::Unauthorized("API key not valid".to_string()))
            }
        }
    }

    /// State over a stub backend with near-zero backoff.
    pub fn state_with(
        credential: bool,
        outcome: Result<String, LlmError>,
    ) -> (AppState, Arc<Mutex<Vec<String>>>) {
        let mut config = AppConfig::default();
        config.upstream.backoff_unit_ms = 1;
        config.server.web_dir = None;
        state_with_config(config, credential, outcome)
    }

    pub fn state_with_config(
        config: AppConfig,
        credential: bool,
        outcome: Result<String, LlmError>,
    ) -> (AppState, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let backend = StubBackend {
            credential,
            outcome,
            prompts: Arc::clone(&prompts),
        };
        let state = AppState::from_parts(
            config,
            BoxGenerationBackend::new(backend),
            PersonaTemplate::default(),
        );
        (state, prompts)
    }
}
