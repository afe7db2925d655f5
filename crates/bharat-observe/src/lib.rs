//! Observability setup for Bharat Guide: structured logging with an optional
//! OpenTelemetry bridge.

pub mod tracing_setup;
