//! Shared domain types for Bharat Guide.
//!
//! Conversation turns, sessions, traveller roles, upstream generation types,
//! configuration, and the error taxonomy shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
