//! Envelope listing from S3 and snapshot caching.
//!
//! # Responsibilities
//!
//! - List the envelope object names from S3 at startup and on a refresh
//!   interval.
//! - Hand request handlers an immutable snapshot of the listing.
//!
//! The envelope's serialised form is the S3 object key (minus the configured
//! prefix); the object body is an opaque presence marker this module never
//! reads. Whether an entry actually decrypts is the validator's business.
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** This module must not import anything from
//!   `common::envelope` or `crate::key`.

pub mod cache;

pub use cache::EnvelopeCache;

use anyhow::{Context, Result};
use tokio::time;
use tracing::{info, warn};

use crate::aws::AwsClients;
use crate::config::Config;

/// List all envelope objects from S3 and atomically replace the cache.
///
/// Pages through `list_objects_v2` under `cfg.token_prefix`, strips the prefix
/// from each object key, and calls [`EnvelopeCache::replace_all`].
///
/// An empty listing is a valid deny-all state, not an error.
///
/// # Errors
///
/// Returns an error if the S3 list call fails.
pub async fn load_all(aws: &AwsClients, cfg: &Config, cache: &EnvelopeCache) -> Result<()> {
    let mut envelopes = Vec::new();

    let mut pages = aws
        .s3
        .list_objects_v2()
        .bucket(&cfg.token_bucket)
        .prefix(&cfg.token_prefix)
        .into_paginator()
        .send();

    while let Some(page) = pages.next().await {
        let page = page.context("failed to list token envelopes from S3")?;
        for obj in page.contents() {
            let key = match obj.key() {
                Some(k) => k,
                None => continue,
            };
            envelopes.push(envelope_name_from_key(key, &cfg.token_prefix));
        }
    }

    if envelopes.is_empty() {
        warn!(
            bucket = %cfg.token_bucket,
            prefix = %cfg.token_prefix,
            "no token envelopes found in S3; all validations will be denied"
        );
    }

    cache.replace_all(envelopes);
    info!(count = cache.len(), "envelope cache refreshed");
    Ok(())
}

/// Spawn a background task that periodically refreshes the envelope cache.
///
/// On refresh failure the previous snapshot is retained and a warning is
/// emitted; the service continues to validate against a stale listing.
pub fn refresh_task(
    aws: AwsClients,
    cfg: Config,
    cache: EnvelopeCache,
) -> tokio::task::JoinHandle<()> {
    let interval = std::time::Duration::from_secs(cfg.token_refresh_interval_secs);
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately — skip it so we don't double-load at startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match load_all(&aws, &cfg, &cache).await {
                Ok(()) => info!("envelope cache refreshed"),
                Err(e) => warn!(error = %e, "envelope refresh failed; retaining previous cache"),
            }
        }
    })
}

/// Derive the serialised envelope from an S3 object key by stripping the
/// configured prefix.
fn envelope_name_from_key(key: &str, prefix: &str) -> String {
    key.strip_prefix(prefix).unwrap_or(key).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_name_strips_prefix() {
        assert_eq!(
            envelope_name_from_key("tokens/00aabbcc", "tokens/"),
            "00aabbcc"
        );
    }

    #[test]
    fn envelope_name_without_prefix_is_kept() {
        assert_eq!(envelope_name_from_key("other/00aabbcc", "tokens/"), "other/00aabbcc");
    }

    #[test]
    fn envelope_name_empty_prefix() {
        assert_eq!(envelope_name_from_key("00aabbcc", ""), "00aabbcc");
    }
}
