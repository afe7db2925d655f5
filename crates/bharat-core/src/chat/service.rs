//! Chat service orchestrating one conversational exchange.
//!
//! ChatService validates input, records the user turn, builds the prompt
//! from the session history, calls the upstream client, and records the
//! assistant turn on success. Failures leave the user turn in place.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use bharat_types::chat::{RoleTag, Session, SessionId, Turn};
use bharat_types::config::{ChatConfig, UpstreamConfig};
use bharat_types::error::ChatError;
use bharat_types::llm::is_valid_model_id;

use crate::chat::store::SessionStore;
use crate::llm::client::UpstreamClient;
use crate::prompt::PromptBuilder;

/// Limits and defaults applied by [`ChatService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub default_model: String,
    pub max_message_length: usize,
    pub max_retries: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default(), &UpstreamConfig::default())
    }
}

impl ChatSettings {
    pub fn from_config(chat: &ChatConfig, upstream: &UpstreamConfig) -> Self {
        Self {
            default_model: upstream.model.clone(),
            max_message_length: chat.max_message_length,
            max_retries: upstream.max_retries,
        }
    }
}

/// One inbound chat message.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub session_id: SessionId,
    /// Explicit role for this message; falls back to the session's role.
    pub role: Option<RoleTag>,
    pub message: String,
    /// Model override; falls back to [`ChatSettings::default_model`].
    pub model: Option<String>,
}

/// Successful outcome of [`ChatService::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub session_id: SessionId,
}

/// Orchestrates chat exchanges over a [`SessionStore`].
///
/// Generic over the store to keep bharat-core free of storage choices.
/// Exchanges on the same session are serialized with a per-session async
/// lock, so the user turn and its assistant turn are always adjacent.
pub struct ChatService<S: SessionStore> {
    store: S,
    upstream: UpstreamClient,
    prompts: PromptBuilder,
    settings: ChatSettings,
    locks: DashMap<SessionId, Arc<Mutex<()>>>,
}

impl<S: SessionStore> ChatService<S> {
    pub fn new(
        store: S,
        upstream: UpstreamClient,
        prompts: PromptBuilder,
        settings: ChatSettings,
    ) -> Self {
        Self {
            store,
            upstream,
            prompts,
            settings,
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Handle one chat message end to end.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        self.validate_message(&request.message)?;
        let model = self.resolve_model(request.model.as_deref())?;

        if !self.upstream.has_credential() {
            warn!(backend = self.upstream.backend_name(), "Chat rejected: API credential not configured");
            return Err(ChatError::Configuration(
                "API key is not configured. Set the API key environment variable and restart."
                    .to_string(),
            ));
        }

        let session_id = request.session_id;
        let lock = self.session_lock(&session_id);
        let _guard = lock.lock().await;

        let role = match request.role {
            Some(role) => {
                self.store.set_role(&session_id, role).await?;
                role
            }
            None => self.store.get_or_create(&session_id).await?.role,
        };

        // Record the attempt before calling upstream so history reflects it
        // even when the call fails.
        let history = self
            .store
            .append_turn(&session_id, Turn::user(request.message.as_str()))
            .await?;

        let prompt = self.prompts.build(role, &request.message, &history);
        debug!(
            session_id = %session_id,
            role = %role,
            history_len = history.len(),
            prompt_chars = prompt.len(),
            "Prompt built"
        );

        let response = self
            .upstream
            .generate(&prompt, &model, self.settings.max_retries)
            .await
            .inspect_err(|e| {
                warn!(session_id = %session_id, kind = %e.kind(), error = %e, "Chat exchange failed");
            })?;

        self.store
            .append_turn(&session_id, Turn::assistant(response.as_str()))
            .await?;

        info!(session_id = %session_id, model = %model, "Chat exchange completed");

        Ok(ChatReply {
            response,
            session_id,
        })
    }

    /// Current snapshot of a session, if it exists.
    pub async fn session(&self, session_id: &SessionId) -> Result<Option<Session>, ChatError> {
        Ok(self.store.get(session_id).await?)
    }

    /// Forget a session's history. Returns whether it existed.
    ///
    /// Waits for an in-flight exchange on the session, but never creates a
    /// lock entry for an id that has none.
    pub async fn reset(&self, session_id: &SessionId) -> Result<bool, ChatError> {
        let existing = self
            .locks
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()));
        let removed = match existing {
            Some(lock) => {
                let _guard = lock.lock().await;
                self.store.remove(session_id).await
            }
            None => self.store.remove(session_id).await,
        };
        self.release_lock(session_id);
        let removed = removed?;
        if removed {
            info!(session_id = %session_id, "Session reset");
        }
        Ok(removed)
    }

    /// Drop sessions idle longer than `max_idle`, along with their locks.
    pub async fn expire_idle(&self, max_idle: Duration) -> Result<usize, ChatError> {
        let expired = self.store.expire_idle(max_idle).await?;
        for id in &expired {
            self.release_lock(id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired idle sessions");
        }
        Ok(expired.len())
    }

    /// Check the upstream credential with a single lightweight call.
    pub async fn validate_key(&self) -> Result<Vec<String>, ChatError> {
        if !self.upstream.has_credential() {
            return Err(ChatError::Configuration(
                "API key is not configured".to_string(),
            ));
        }
        Ok(self.upstream.validate_credentials().await?)
    }

    fn validate_message(&self, message: &str) -> Result<(), ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::Validation("Message cannot be empty".to_string()));
        }
        let length = message.chars().count();
        if length > self.settings.max_message_length {
            return Err(ChatError::Validation(format!(
                "Message is too long ({length} characters, maximum {})",
                self.settings.max_message_length
            )));
        }
        Ok(())
    }

    fn resolve_model(&self, requested: Option<&str>) -> Result<String, ChatError> {
        let model = match requested.map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => self.settings.default_model.as_str(),
        };
        if !is_valid_model_id(model) {
            return Err(ChatError::Validation(format!("Invalid model id: '{model}'")));
        }
        Ok(model.to_string())
    }

    fn session_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Remove a session's lock entry unless another exchange still holds it.
    fn release_lock(&self, session_id: &SessionId) {
        self.locks
            .remove_if(session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
