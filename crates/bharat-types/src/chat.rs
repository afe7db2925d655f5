//! Conversation types for Bharat Guide.
//!
//! These types model a short-lived conversation between a traveller and the
//! assistant: turns, the traveller's role, and the in-memory session that
//! holds a bounded history of turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Identifier used when a request does not name a session.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// One message in a conversation. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// The traveller persona the assistant tailors its answers to.
///
/// Purely descriptive: it changes prompt phrasing, never control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    #[default]
    Tourist,
    TravelAgent,
    LocalGuide,
    Backpacker,
}

impl RoleTag {
    /// Every role, in the order they are offered to clients.
    pub const ALL: [RoleTag; 4] = [
        RoleTag::Tourist,
        RoleTag::TravelAgent,
        RoleTag::LocalGuide,
        RoleTag::Backpacker,
    ];

    /// Human-readable name, as it appears in prompts and in the roles listing.
    pub fn display_name(&self) -> &'static str {
        match self {
            RoleTag::Tourist => "Tourist",
            RoleTag::TravelAgent => "Travel Agent",
            RoleTag::LocalGuide => "Local Guide",
            RoleTag::Backpacker => "Backpacker",
        }
    }

    /// One-line description served by the roles endpoint.
    pub fn description(&self) -> &'static str {
        match self {
            RoleTag::Tourist => "General tourist looking for recommendations",
            RoleTag::TravelAgent => "Professional travel advisor",
            RoleTag::LocalGuide => "Local with deep cultural knowledge",
            RoleTag::Backpacker => "Budget-conscious adventurer",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RoleTag {
    type Err = String;

    /// Accepts the display name ("Travel Agent") case-insensitively, or the
    /// snake_case form ("travel_agent").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        RoleTag::ALL
            .into_iter()
            .find(|role| role.display_name().to_lowercase() == normalized)
            .ok_or_else(|| format!("unknown role: '{}'", s.trim()))
    }
}

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve an optional client-supplied id; missing or blank ids map to
    /// the shared default session.
    pub fn resolve(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(DEFAULT_SESSION_ID.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, bounded, in-memory conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub history: Vec<Turn>,
    pub role: RoleTag,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// A fresh session with empty history and the default role.
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: Vec::new(),
            role: RoleTag::default(),
            created_at: now,
            last_active: now,
        }
    }

    /// Append a turn and drop the oldest turns until at most `max_history`
    /// remain.
    pub fn push_bounded(&mut self, turn: Turn, max_history: usize) {
        self.history.push(turn);
        if self.history.len() > max_history {
            let excess = self.history.len() - max_history;
            self.history.drain(..excess);
        }
        self.last_active = Utc::now();
    }
}
