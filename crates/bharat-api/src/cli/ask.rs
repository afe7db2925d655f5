//! `bharat ask` -- one chat exchange from the command line.

use bharat_core::chat::service::ChatRequest;
use bharat_types::chat::{RoleTag, SessionId};
use bharat_types::error::ChatError;

use crate::state::AppState;

/// Send one message through the chat service and print the reply.
pub async fn ask(
    state: &AppState,
    message: String,
    role: Option<String>,
    session: Option<String>,
    model: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let role = role
        .as_deref()
        .map(str::parse::<RoleTag>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let request = ChatRequest {
        session_id: SessionId::resolve(session.as_deref()),
        role,
        message,
        model,
    };

    match state.chat_service.handle(request).await {
        Ok(reply) => {
            if json {
                let out = serde_json::json!({
                    "success": true,
                    "response": reply.response,
                    "session_id": reply.session_id,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!();
                println!(
                    "  {} {}",
                    console::style("Bharat Guide").cyan().bold(),
                    console::style(format!("({})", reply.session_id)).dim()
                );
                println!();
                for line in reply.response.lines() {
                    println!("  {line}");
                }
                println!();
            }
            Ok(())
        }
        Err(e) => {
            let message = user_message(&e);
            if json {
                let out = serde_json::json!({
                    "success": false,
                    "error": message,
                    "error_kind": e.kind(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            Err(anyhow::anyhow!(message))
        }
    }
}

fn user_message(err: &ChatError) -> String {
    match err {
        ChatError::Upstream(llm) => llm.user_message(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::state_with;
    use bharat_types::llm::LlmError;

    #[tokio::test]
    async fn ask_records_exchange() {
        let (state, prompts) = state_with(true, Ok("Carry an umbrella.".into()));

        ask(
            &state,
            "Monsoon in Mumbai?".into(),
            Some("local_guide".into()),
            Some("cli".into()),
            None,
            true,
        )
        .await
        .unwrap();

        assert!(prompts.lock().unwrap()[0].contains("Role: Local Guide"));
        let session = state
            .chat_service
            .session(&SessionId::new("cli"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn ask_rejects_unknown_role() {
        let (state, prompts) = state_with(true, Ok("unused".into()));
        let err = ask(&state, "Hi".into(), Some("pilot".into()), None, None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown role"));
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ask_surfaces_upstream_message() {
        let (state, _) = state_with(true, Err(LlmError::Unauthorized("API Error: bad key".into())));
        let err = ask(&state, "Hi".into(), None, None, None, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API Error: bad key");
    }
}
