//! Request and response types served over the gateway's HTTP API.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Verify endpoint
// ---------------------------------------------------------------------------

/// Successful response body for `GET /verify`.
///
/// Only returned with `200 OK`; denials use [`ErrorResponse`]. The body never
/// reveals which stored envelope matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Always `"ok"` — either the path is not protected or the token matched.
    pub status: String,
}

impl VerifyResponse {
    /// The single allowed response.
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"unauthorized"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the encryption key is currently loaded.
    pub key_ready: bool,
    /// Number of stored envelopes in the current snapshot. Zero is a valid
    /// deny-all state, not a degradation.
    pub envelopes_cached: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_response_is_ok() {
        let v = VerifyResponse::ok();
        assert_eq!(v.status, "ok");
    }

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("unauthorized", "token did not match");
        assert_eq!(e.code, "unauthorized");
        assert!(e.message.contains("did not match"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            key_ready: true,
            envelopes_cached: 7,
        };
        let json = serde_json::to_string(&h).unwrap();
        let decoded: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.envelopes_cached, 7);
        assert!(decoded.key_ready);
    }
}
