//! Google Gemini generative language backend.
//!
//! This module provides [`GeminiBackend`], which implements the
//! [`GenerationBackend`](bharat_core::llm::backend::GenerationBackend) trait
//! over the `generateContent` REST endpoint.

pub mod client;
pub mod types;

pub use client::GeminiBackend;
