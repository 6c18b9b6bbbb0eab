//! Service-level error type shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::Unavailable`] → 503
///
/// A failed or missing candidate token is always `Unauthorized`; a missing
/// or invalid encryption key is `Unavailable` — a configuration problem,
/// deliberately distinct from an authorization denial.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed — unreadable header or invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The candidate token was missing or did not match any stored token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A required resource (the encryption key) is not yet loaded or is
    /// temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::Unauthorized("x".into()).http_status(), 401);
        assert_eq!(ServiceError::Unavailable("x".into()).http_status(), 503);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::Unavailable("encryption key not loaded".into());
        assert!(e.to_string().contains("encryption key not loaded"));
    }
}
