//! `bharat validate-key` -- check the configured credential.

use crate::state::AppState;

/// Validate the API key with a single listing call.
pub async fn validate_key(state: &AppState, json: bool) -> anyhow::Result<()> {
    let models = state.chat_service.validate_key().await?;

    if json {
        let out = serde_json::json!({
            "success": true,
            "message": "API key is valid",
            "models": models,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} API key is valid ({} models available)",
            console::style("✓").green(),
            models.len()
        );
        for model in models.iter().take(10) {
            println!("    {}", console::style(model).dim());
        }
        println!();
    }

    Ok(())
}
