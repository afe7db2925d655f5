//! Conversation state and orchestration.
//!
//! `SessionStore` is the port for session history; `ChatService` drives one
//! exchange from validation through the upstream call.

pub mod service;
pub mod store;
