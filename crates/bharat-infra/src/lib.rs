//! Infrastructure layer for Bharat Guide.
//!
//! Contains the Gemini implementation of the `GenerationBackend` trait
//! defined in `bharat-core`, and the TOML + environment configuration loader.

pub mod config;
pub mod llm;
