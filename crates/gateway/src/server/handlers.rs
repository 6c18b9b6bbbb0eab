//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{ErrorResponse, HealthResponse, VerifyResponse};
use common::validate::validate;
use common::ServiceError;

use super::guard;
use super::state::AppState;

/// `GET /verify` — authorize one request against the stored envelope set.
///
/// Driven as an auth subrequest by the reverse proxy: the URI being authorized
/// arrives in the configured original-URI header, the candidate token in the
/// token header. Returns `200` when the URI is not protected or the token
/// matches a stored envelope, `401` otherwise, and `503` when the encryption
/// key has not been loaded (a configuration problem, not a denial).
///
/// A missing or mismatched token produces the same response body; nothing in
/// the reply says which stored envelope matched or why an entry was rejected.
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // A missing or unreadable original-URI header means we cannot prove the
    // request is exempt, so it is treated as protected.
    let protected = match header_str(&headers, &state.original_uri_header) {
        Some(uri) => guard::is_protected(uri, &state.protected_prefix, &state.excluded_prefixes),
        None => true,
    };
    if !protected {
        return (StatusCode::OK, Json(VerifyResponse::ok())).into_response();
    }

    let candidate = match header_str(&headers, &state.token_header_name) {
        Some(token) if !token.is_empty() => token.to_owned(),
        _ => return denied(),
    };

    let key = match state.key_store.current().await {
        Ok(k) => k,
        Err(_) => {
            return error_response(ServiceError::Unavailable(
                "encryption key not loaded".into(),
            ))
        }
    };

    let stored = state.envelope_cache.snapshot();
    if validate(&candidate, &stored, &key) {
        (StatusCode::OK, Json(VerifyResponse::ok())).into_response()
    } else {
        denied()
    }
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when the encryption key is loaded, `503 Service
/// Unavailable` otherwise. An empty envelope cache is a valid deny-all state
/// and does not degrade health; the count is reported for observability.
pub async fn health(State(state): State<AppState>) -> Response {
    let key_ready = state.key_store.is_ready().await;
    let envelopes_cached = state.envelope_cache.len();

    let (status_code, status_str) = if key_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        key_ready,
        envelopes_cached,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Read a header as UTF-8 text; unreadable values count as absent.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The single authorization-denied response, identical for a missing token
/// and a token that matched nothing.
fn denied() -> Response {
    error_response(ServiceError::Unauthorized("missing or invalid token".into()))
}

/// Render a [`ServiceError`] as its HTTP status and standard error body.
fn error_response(err: ServiceError) -> Response {
    let (code, message) = match &err {
        ServiceError::BadRequest(m) => ("bad_request", m.clone()),
        ServiceError::Unauthorized(m) => ("unauthorized", m.clone()),
        ServiceError::Unavailable(m) => ("service_unavailable", m.clone()),
        ServiceError::Internal(m) => ("internal_error", m.clone()),
    };
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(code, message))).into_response()
}
