//! Gemini REST API types.
//!
//! Wire structures for `generateContent` and `models` listing. Every response
//! field is optional so that shape drift surfaces as `EmptyGeneration`
//! rather than a parse failure.

use serde::{Deserialize, Serialize};

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Single-turn request carrying one text part.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Response body of `generateContent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Every text part across all candidates, concatenated in order.
    ///
    /// `None` when the concatenation is empty.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Error envelope: `{"error": {"code": 429, "message": "...", "status": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response body of `GET models`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let body = GenerateContentRequest::from_prompt("Namaste");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"parts": [{"text": "Namaste"}]}]})
        );
    }

    #[test]
    fn test_text_concatenates_parts_across_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"Visit "},{"text":"Goa"}]}},
                {"content":{"parts":[{"text":" in winter."}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("Visit Goa in winter."));
    }

    #[test]
    fn test_text_handles_missing_pieces() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
        ] {
            let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
            assert_eq!(resp.text(), None, "body: {body}");
        }
    }

    #[test]
    fn test_error_envelope_parse() {
        let env: ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
        )
        .unwrap();
        assert_eq!(env.error.message.as_deref(), Some("API key not valid."));
        assert_eq!(env.error.status.as_deref(), Some("INVALID_ARGUMENT"));
    }
}
