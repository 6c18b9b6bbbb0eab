//! [`KeyStore`]: thread-safe cache for the current encryption key.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use common::EncryptionKey;

/// Errors produced by the key cache.
#[derive(Debug, Error)]
pub enum KeyCacheError {
    /// The encryption key has not yet been fetched and parsed.
    #[error("encryption key not yet loaded")]
    NotLoaded,
}

/// Thread-safe store for the current encryption key.
///
/// Wraps an `Arc<RwLock<Option<EncryptionKey>>>` so that:
/// - Many concurrent read-lock holders (request handlers) can clone the key
///   simultaneously without contention.
/// - A single write-lock holder (the background refresh task) can atomically
///   swap in a new key without blocking readers for more than a microsecond.
///
/// The key type itself zeroes its bytes on drop and redacts `Debug` output,
/// so clones handed to request handlers leave nothing behind.
#[derive(Clone, Debug)]
pub struct KeyStore {
    inner: Arc<RwLock<Option<EncryptionKey>>>,
}

impl KeyStore {
    /// Create a new, empty [`KeyStore`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns `true` if a key is currently cached.
    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Store (or replace) the current key.
    pub async fn store(&self, key: EncryptionKey) {
        let mut lock = self.inner.write().await;
        *lock = Some(key);
    }

    /// Clone the current key for use in one validation.
    ///
    /// # Errors
    ///
    /// Returns [`KeyCacheError::NotLoaded`] if no key has been stored yet.
    pub async fn current(&self) -> Result<EncryptionKey, KeyCacheError> {
        let lock = self.inner.read().await;
        lock.as_ref().cloned().ok_or(KeyCacheError::NotLoaded)
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
