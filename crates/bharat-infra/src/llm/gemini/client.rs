//! GeminiBackend -- concrete [`GenerationBackend`] for the Gemini REST API.
//!
//! Sends `POST {base}/models/{model}:generateContent?key=...` and classifies
//! every outcome into an [`LlmError`]. Retrying is not done here; that is the
//! job of `UpstreamClient` in bharat-core.
//!
//! The API key is wrapped in [`secrecy::SecretString`]. It travels in the
//! query string, so reqwest errors are stripped of their URL before they are
//! turned into messages.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use bharat_core::llm::backend::GenerationBackend;
use bharat_types::llm::{GenerationRequest, LlmError};

use super::types::{
    ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, ListModelsResponse,
};

/// Default base URL of the generative language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Key values shipped in sample `.env` files that are never real credentials.
const PLACEHOLDER_KEYS: &[&str] = &["your_api_key_here", "changeme", "none", "null"];

/// Longest slice of a non-JSON error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Gemini generation backend. Intentionally not `Debug`.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl GeminiBackend {
    /// Create a backend. `timeout` bounds every request end to end.
    pub fn new(api_key: Option<SecretString>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn key(&self) -> Result<&str, LlmError> {
        match &self.api_key {
            Some(key) if is_usable_key(key.expose_secret()) => Ok(key.expose_secret()),
            _ => Err(LlmError::Unauthorized("API key is not configured".to_string())),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }
}

impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn has_credential(&self) -> bool {
        self.key().is_ok()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let key = self.key()?;
        let body = GenerateContentRequest::from_prompt(&request.prompt);

        let response = self
            .client
            .post(self.generate_url(&request.model))
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed.text().ok_or(LlmError::EmptyGeneration)
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let key = self.key()?;

        let response = self
            .client
            .get(self.models_url())
            .query(&[("key", key)])
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let parsed: ListModelsResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Reject empty keys and the placeholders from sample configuration.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() {
        return false;
    }
    let lower = key.to_ascii_lowercase();
    !(PLACEHOLDER_KEYS.contains(&lower.as_str()) || lower.starts_with("your_"))
}

fn classify_transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        return LlmError::Timeout;
    }
    let err = err.without_url();
    if err.is_decode() || err.is_body() {
        return LlmError::MalformedResponse(err.to_string());
    }
    LlmError::Connection(err.to_string())
}

/// Map a non-success status and its body to an [`LlmError`].
///
/// Gemini reports a bad key as `400 INVALID_ARGUMENT` with an "API key not
/// valid" message, so that case is classified as `Unauthorized` too.
fn classify_status(status: StatusCode, body: &str) -> LlmError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let upstream_message = envelope
        .as_ref()
        .and_then(|e| e.error.message.as_deref())
        .filter(|m| !m.trim().is_empty());

    let message = match upstream_message {
        Some(msg) => format!("API Error: {msg}"),
        None => format!("HTTP {}: {}", status.as_u16(), truncate(body.trim())),
    };

    let bad_key = upstream_message.is_some_and(|m| m.contains("API key not valid"))
        || envelope
            .as_ref()
            .and_then(|e| e.error.status.as_deref())
            .is_some_and(|s| s == "UNAUTHENTICATED");

    match status.as_u16() {
        401 => LlmError::Unauthorized(message),
        403 => LlmError::Forbidden(message),
        429 => LlmError::RateLimited(message),
        400 if bad_key => LlmError::Unauthorized(message),
        code @ 400..=499 => LlmError::InvalidRequest {
            status: code,
            message,
        },
        code => LlmError::UpstreamServerError {
            status: code,
            message,
        },
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Json, Path, Query};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use std::collections::HashMap;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn spawn_mock(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta")
    }

    /// Mock that answers every generate call with a fixed status and body.
    async fn fixed_response(status: u16, body: &'static str) -> String {
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(move || async move {
                (
                    AxumStatus::from_u16(status).unwrap(),
                    [("content-type", "application/json")],
                    body,
                )
            }),
        );
        spawn_mock(router).await
    }

    fn backend(base_url: &str) -> GeminiBackend {
        GeminiBackend::new(
            Some(SecretString::from("AIza-test-key")),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url)
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }

    #[test]
    fn test_placeholder_keys_are_not_usable() {
        assert!(is_usable_key("AIzaSyExample"));
        assert!(!is_usable_key(""));
        assert!(!is_usable_key("   "));
        assert!(!is_usable_key("your_api_key_here"));
        assert!(!is_usable_key("YOUR_GEMINI_KEY"));
        assert!(!is_usable_key("changeme"));
    }

    #[test]
    fn test_has_credential() {
        let none = GeminiBackend::new(None, Duration::from_secs(1)).unwrap();
        assert!(!none.has_credential());
        let placeholder = GeminiBackend::new(
            Some(SecretString::from("your_api_key_here")),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!placeholder.has_credential());
        assert!(backend("http://localhost").has_credential());
    }

    #[test]
    fn test_classify_status_codes() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, body),
            LlmError::RateLimited("API Error: Resource has been exhausted".into())
        );
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "{}"),
            LlmError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, ""),
            LlmError::Forbidden(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "not found"),
            LlmError::InvalidRequest { status: 404, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "down"),
            LlmError::UpstreamServerError { status: 503, .. }
        ));
    }

    #[test]
    fn test_invalid_key_400_is_unauthorized() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, body),
            LlmError::Unauthorized(
                "API Error: API key not valid. Please pass a valid API key.".into()
            )
        );
    }

    #[test]
    fn test_non_json_error_body_is_truncated() {
        let body = "x".repeat(500);
        match classify_status(StatusCode::BAD_GATEWAY, &body) {
            LlmError::UpstreamServerError { status, message } => {
                assert_eq!(status, 502);
                assert!(message.starts_with("HTTP 502: "));
                assert!(message.ends_with("..."));
                assert!(message.len() < 250);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_key() {
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(
                |Path(rest): Path<String>,
                 Query(query): Query<HashMap<String, String>>,
                 Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(rest, "gemini-1.5-flash:generateContent");
                    assert_eq!(query.get("key").map(String::as_str), Some("AIza-test-key"));
                    let prompt = body["contents"][0]["parts"][0]["text"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string();
                    Json(serde_json::json!({
                        "candidates": [{"content": {"parts": [{"text": format!("echo: {prompt}")}]}}]
                    }))
                },
            ),
        );
        let base = spawn_mock(router).await;

        let text = backend(&base)
            .generate(&request("Best time to visit Kerala?"))
            .await
            .unwrap();

        assert_eq!(text, "echo: Best time to visit Kerala?");
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let base = fixed_response(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;
        let err = backend(&base).generate(&request("hi")).await.unwrap_err();
        assert_eq!(err, LlmError::RateLimited("API Error: Quota exceeded".into()));
    }

    #[tokio::test]
    async fn test_generate_server_error() {
        let base = fixed_response(500, r#"{"error":{"message":"Internal error"}}"#).await;
        let err = backend(&base).generate(&request("hi")).await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::UpstreamServerError { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_generate_empty_candidates() {
        let base = fixed_response(200, r#"{"candidates":[]}"#).await;
        let err = backend(&base).generate(&request("hi")).await.unwrap_err();
        assert_eq!(err, LlmError::EmptyGeneration);
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let base = fixed_response(200, "<html>not json</html>").await;
        let err = backend(&base).generate(&request("hi")).await.unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_timeout() {
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = spawn_mock(router).await;
        let backend = GeminiBackend::new(
            Some(SecretString::from("AIza-test-key")),
            Duration::from_millis(100),
        )
        .unwrap()
        .with_base_url(&base);

        let err = backend.generate(&request("hi")).await.unwrap_err();
        assert_eq!(err, LlmError::Timeout);
    }

    #[tokio::test]
    async fn test_generate_connection_refused_hides_key() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend(&format!("http://{addr}/v1beta"))
            .generate(&request("hi"))
            .await
            .unwrap_err();

        match err {
            LlmError::Connection(message) => assert!(!message.contains("AIza-test-key")),
            other => panic!("expected Connection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_without_key_makes_no_call() {
        let backend = GeminiBackend::new(None, Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = backend.generate(&request("hi")).await.unwrap_err();
        assert!(matches!(err, LlmError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_list_models() {
        let router = Router::new().route(
            "/v1beta/models",
            get(|| async {
                Json(serde_json::json!({
                    "models": [
                        {"name": "models/gemini-1.5-pro-latest"},
                        {"name": "models/gemini-1.5-flash"}
                    ]
                }))
            }),
        );
        let base = spawn_mock(router).await;

        let models = backend(&base).list_models().await.unwrap();

        assert_eq!(
            models,
            vec![
                "models/gemini-1.5-pro-latest".to_string(),
                "models/gemini-1.5-flash".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_list_models_rejected_key() {
        let router = Router::new().route(
            "/v1beta/models",
            get(|| async {
                (
                    AxumStatus::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
                    })),
                )
            }),
        );
        let base = spawn_mock(router).await;

        let err = backend(&base).list_models().await.unwrap_err();
        assert!(matches!(err, LlmError::Unauthorized(_)));
    }
}
