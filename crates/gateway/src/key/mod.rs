//! Encryption-key fetch, cache, and background refresh.
//!
//! # Lifecycle
//!
//! 1. At startup, [`fetch_and_store`] reads the key string from AWS Secrets
//!    Manager and parses it with the key codec.
//! 2. The parsed key lives only in process memory, wrapped in an `Arc<RwLock<_>>`.
//! 3. A background Tokio task started by [`refresh_task`] re-fetches the key on
//!    a configurable interval, so an operator-side key change is picked up
//!    without a restart.
//! 4. Request handlers borrow the key via [`KeyStore::current`], which acquires
//!    a short read lock and clones the key for the duration of one validation.
//!
//! # Security invariants
//!
//! - The key is **never** written to disk, logged, or included in traces.
//! - Rotating the key without re-encrypting the stored envelopes invalidates
//!   every one of them; that is an operator decision, not something this
//!   module guards against.

pub mod store;

pub use store::KeyStore;

use anyhow::{Context, Result};
use common::EncryptionKey;
use tokio::time;
use tracing::{info, warn};

use crate::aws::AwsClients;
use crate::config::Config;

/// Fetch the key string from Secrets Manager, parse it, and cache it in `store`.
///
/// # Errors
///
/// Returns an error if the Secrets Manager call fails, if the secret has no
/// string value, or if the string is not a valid external key representation.
pub async fn fetch_and_store(aws: &AwsClients, cfg: &Config, store: &KeyStore) -> Result<()> {
    let secret = aws
        .secretsmanager
        .get_secret_value()
        .secret_id(&cfg.key_secret_id)
        .send()
        .await
        .context("failed to fetch encryption key from Secrets Manager")?;

    let raw = secret
        .secret_string()
        .context("encryption key secret must be stored as a string")?;

    let key = EncryptionKey::parse(raw)
        .context("encryption key secret is not a valid 64-hex-character key")?;

    store.store(key).await;
    info!("encryption key fetched and cached");
    Ok(())
}

/// Spawn a background task that periodically re-fetches the encryption key.
///
/// The first refresh fires after one full interval (startup fetch is assumed
/// to have already populated the store). On refresh failure the previous key
/// is retained and a warning is emitted.
pub fn refresh_task(aws: AwsClients, cfg: Config, store: KeyStore) -> tokio::task::JoinHandle<()> {
    let interval = std::time::Duration::from_secs(cfg.key_refresh_interval_secs);
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately — skip it so we don't double-fetch.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match fetch_and_store(&aws, &cfg, &store).await {
                Ok(()) => info!("encryption key refreshed"),
                Err(e) => warn!(error = %e, "key refresh failed; retaining previous key"),
            }
        }
    })
}
