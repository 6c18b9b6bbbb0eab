//! OpenTelemetry setup: traces and structured logs.
//!
//! Spans are exported over OTLP/gRPC when an endpoint is configured; without
//! one the gateway logs locally and skips the exporter, so it can run without
//! a collector.
//!
//! # Telemetry invariants
//!
//! - **No token or key material** must appear in any span attribute, metric
//!   label, or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::init_telemetry;
