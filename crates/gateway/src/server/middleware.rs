//! Axum middleware layers applied to the router.
//!
//! Includes request tracing, timeout enforcement, and response compression.

use std::time::Duration;

/// Default per-request timeout applied to all routes.
///
/// This bounds the whole call, validation scan included; the scan itself has
/// no internal cancellation point.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
