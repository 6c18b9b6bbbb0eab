//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::key::KeyStore;
use crate::tokens::EnvelopeCache;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe store for the current encryption key.
    pub key_store: KeyStore,
    /// Lock-free snapshot cache of the stored envelope listing.
    pub envelope_cache: EnvelopeCache,
    /// Name of the HTTP header carrying the candidate token.
    pub token_header_name: Arc<String>,
    /// Name of the HTTP header carrying the URI being authorized.
    pub original_uri_header: Arc<String>,
    /// Path prefix that requires a valid token.
    pub protected_prefix: Arc<String>,
    /// Path prefixes exempt from token checks.
    pub excluded_prefixes: Arc<Vec<String>>,
}

impl AppState {
    /// Create a new [`AppState`] from the stores and the relevant config fields.
    pub fn new(key_store: KeyStore, envelope_cache: EnvelopeCache, cfg: &Config) -> Self {
        Self {
            key_store,
            envelope_cache,
            token_header_name: Arc::new(cfg.token_header_name.clone()),
            original_uri_header: Arc::new(cfg.original_uri_header.clone()),
            protected_prefix: Arc::new(cfg.protected_prefix.clone()),
            excluded_prefixes: Arc::new(cfg.excluded_prefix_list()),
        }
    }
}

#[cfg(test)]
impl Default for AppState {
    /// Empty stores, default header names, everything protected. For tests.
    fn default() -> Self {
        Self {
            key_store: KeyStore::new(),
            envelope_cache: EnvelopeCache::new(),
            token_header_name: Arc::new("x-api-token".into()),
            original_uri_header: Arc::new("x-original-uri".into()),
            protected_prefix: Arc::new("/".into()),
            excluded_prefixes: Arc::new(Vec::new()),
        }
    }
}
