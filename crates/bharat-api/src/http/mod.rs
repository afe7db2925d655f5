//! HTTP/REST API layer for Bharat Guide.
//!
//! Axum-based JSON API under `/api/` with CORS, request tracing, and panic
//! containment.

pub mod error;
pub mod handlers;
pub mod router;
