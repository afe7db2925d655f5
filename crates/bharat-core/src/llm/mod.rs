//! Upstream generation abstractions for Bharat Guide.
//!
//! - `GenerationBackend`: RPITIT trait, one outbound call per invocation
//! - `BoxGenerationBackend`: object-safe wrapper for dynamic dispatch
//! - `RetryPolicy`: pure retry/backoff decisions over classified errors
//! - `UpstreamClient`: the attempt loop tying the three together

pub mod backend;
pub mod box_backend;
pub mod client;
pub mod retry;
