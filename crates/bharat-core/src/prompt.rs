//! Prompt builder for the Bharat Guide assistant.
//!
//! The upstream API is called single-shot, so the whole conversation is
//! flattened into one text prompt:
//!
//! ```text
//! {persona, with {role} substituted}
//!
//! Previous conversation:
//! User: ...
//! Bharat Guide: ...
//!
//! Current user message: "{message}"
//!
//! {closing instruction}
//! ```

use bharat_types::chat::{RoleTag, Turn, TurnRole};

/// Placeholder replaced by the traveller role's display name.
pub const ROLE_PLACEHOLDER: &str = "{role}";

const DEFAULT_ASSISTANT_NAME: &str = "Bharat Guide";

const DEFAULT_PERSONA: &str = "\
You are an AI Assistant named Bharat Guide that provides travel-related information about India.

Role: {role}
(Examples: Tourist, Travel Agent, Local Guide, Backpacker)

Answer ONLY travel-related questions about India.
Topics you can cover:
- Destinations and sightseeing places
- Trip plans, itineraries, weekend getaways
- Indian food and cuisine by region
- Culture, traditions, local phrases, etiquette
- Transport options (trains, buses, taxis)
- Climate and best times to visit
- Entry rules, permits, visa guidance

Response Guidelines:
- Do NOT use markdown (e.g., **, *, #) or code blocks
- Use plain text for readability and clean formatting
- Use bullet points (- ) for unordered info
- Use numbered lists (1. ) when listing steps or order
- Keep paragraphs short (2-3 lines max)
- Limit emojis to 1-2 if they enhance clarity
- Include at most 1-2 Hindi words or phrases per response, with a translation in parentheses
- Keep humour moderate and the tone helpful and friendly";

const DEFAULT_CLOSING: &str = "\
Reply in a friendly, moderately informative way, suitable to the user's role. \
Include at most 1-2 Hindi words where natural.";

/// Swappable persona text wrapped around every prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaTemplate {
    /// Opening instructions; may contain [`ROLE_PLACEHOLDER`].
    pub system: String,
    /// Speaker label used for assistant turns in the transcript.
    pub assistant_name: String,
    /// Final instruction appended after the current message.
    pub closing: String,
}

impl Default for PersonaTemplate {
    fn default() -> Self {
        Self {
            system: DEFAULT_PERSONA.to_string(),
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            closing: DEFAULT_CLOSING.to_string(),
        }
    }
}

impl PersonaTemplate {
    /// Parse a persona file.
    ///
    /// An optional first line `# assistant: <Name>` renames the assistant
    /// speaker. A line consisting of `---` separates the system text from the
    /// closing instruction; without it the built-in closing is kept.
    pub fn parse(text: &str) -> Self {
        let mut assistant_name = DEFAULT_ASSISTANT_NAME.to_string();
        let mut lines: Vec<&str> = text.lines().collect();

        if let Some(name) = lines
            .first()
            .and_then(|line| line.trim().strip_prefix("# assistant:"))
        {
            let name = name.trim();
            if !name.is_empty() {
                assistant_name = name.to_string();
            }
            lines.remove(0);
        }

        let (system, closing) = match lines.iter().position(|line| line.trim_end() == "---") {
            Some(at) => (
                lines[..at].join("\n"),
                lines[at + 1..].join("\n").trim().to_string(),
            ),
            None => (lines.join("\n"), DEFAULT_CLOSING.to_string()),
        };

        Self {
            system: system.trim().to_string(),
            assistant_name,
            closing,
        }
    }
}

/// Composes persona, role, transcript, and current message into one prompt.
///
/// Deterministic and side-effect free.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    persona: PersonaTemplate,
}

impl PromptBuilder {
    pub fn new(persona: PersonaTemplate) -> Self {
        Self { persona }
    }

    pub fn persona(&self) -> &PersonaTemplate {
        &self.persona
    }

    /// Build the prompt.
    ///
    /// `history` is expected to end with the just-appended current message,
    /// so the transcript lists every turn except the last one, and is omitted
    /// entirely unless at least one earlier turn exists.
    pub fn build(&self, role: RoleTag, current_message: &str, history: &[Turn]) -> String {
        let mut sections = Vec::with_capacity(4);

        sections.push(
            self.persona
                .system
                .replace(ROLE_PLACEHOLDER, role.display_name())
                .trim()
                .to_string(),
        );

        if let Some((_, earlier)) = history.split_last() {
            if !earlier.is_empty() {
                let lines: Vec<String> = earlier
                    .iter()
                    .map(|turn| format!("{}: {}", self.speaker(turn.role), turn.content))
                    .collect();
                sections.push(format!("Previous conversation:\n{}", lines.join("\n")));
            }
        }

        sections.push(format!("Current user message: \"{current_message}\""));

        if !self.persona.closing.trim().is_empty() {
            sections.push(self.persona.closing.trim().to_string());
        }

        sections.join("\n\n")
    }

    fn speaker(&self, role: TurnRole) -> &str {
        match role {
            TurnRole::User => "User",
            TurnRole::Assistant => &self.persona.assistant_name,
        }
    }
}
