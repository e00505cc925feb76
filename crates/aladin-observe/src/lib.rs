//! Observability setup for Aladin: tracing subscriber and optional
//! OpenTelemetry export.

pub mod tracing_setup;
