//! Business logic and port definitions for Bharat Guide.
//!
//! This crate defines the "ports" (session store and generation backend
//! traits) that the infrastructure layer implements, plus the pure prompt
//! builder and the chat orchestration on top of them. It depends only on
//! `bharat-types` -- never on `bharat-infra` or any HTTP crate.

pub mod chat;
pub mod llm;
pub mod prompt;
