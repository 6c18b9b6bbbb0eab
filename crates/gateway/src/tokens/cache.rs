//! In-memory snapshot of the stored envelope set.
//!
//! The listing is loaded at startup and refreshed on a configurable interval.
//! The cache uses `arc-swap` for lock-free reads on the hot path: a request
//! takes an `Arc` snapshot once and scans it, so a mid-scan refresh can never
//! skip or duplicate an entry for that request.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Shared, lock-free snapshot of the serialised envelope listing.
///
/// Internally backed by [`ArcSwap`] so readers never block and the background
/// refresh task can atomically swap in a completely new listing.
#[derive(Clone, Debug)]
pub struct EnvelopeCache {
    inner: Arc<ArcSwap<Vec<String>>>,
}

impl EnvelopeCache {
    /// Create a new, empty [`EnvelopeCache`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(Vec::new()))),
        }
    }

    /// Number of envelopes in the current snapshot.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Returns `true` if the current snapshot holds no envelopes.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Take an owned snapshot of the current listing.
    ///
    /// This is a lock-free read; safe to call on the hot validation path. The
    /// returned `Arc` keeps its contents alive and unchanged even if the
    /// refresh task replaces the listing mid-scan.
    pub fn snapshot(&self) -> Arc<Vec<String>> {
        self.inner.load_full()
    }

    /// Atomically replace the entire listing.
    ///
    /// Called by the background refresh task after listing the envelope
    /// objects from S3.
    pub fn replace_all(&self, envelopes: Vec<String>) {
        self.inner.store(Arc::new(envelopes));
    }
}

impl Default for EnvelopeCache {
    fn default() -> Self {
        Self::new()
    }
}
