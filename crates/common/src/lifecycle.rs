//! Token generation, persistence, and rotation.
//!
//! # Lifecycle
//!
//! 1. [`generate_tokens`] mints fresh plaintext tokens according to a
//!    [`TokenPolicy`].
//! 2. [`encrypt_and_persist`] seals each token into an envelope and writes it
//!    to the [`TokenStore`] collaborator, one at a time, capturing per-item
//!    failures instead of aborting the batch.
//! 3. [`rotate`] chains the two and returns a [`RotationReport`] carrying the
//!    new plaintext tokens for out-of-band distribution.
//!
//! Rotation is append-only: it never reads, rewrites, or deletes existing
//! envelopes. Removing old tokens is a separate, explicit operator action.

use rand::rngs::OsRng;
use rand::Rng;
use thiserror::Error;

use crate::envelope::{Envelope, EnvelopeError};
use crate::keyfmt::EncryptionKey;

/// Character set used when `special_chars` is off: pure hexadecimal.
const HEX_ALPHABET: &[u8] = b"0123456789abcdef";

/// Wider character set selected by `special_chars`.
const WIDE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*_+=";

/// Number of characters between separators in a formatted token.
const GROUP_LEN: usize = 8;

/// Generation policy for a batch of tokens.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    /// Number of random characters per token (excluding prefix and separators).
    pub length: usize,
    /// Fixed prefix for every token. When `None`, each token gets a
    /// positional `key{i}-` prefix to reduce accidental collisions.
    pub prefix: Option<String>,
    /// Draw from the wider alphabet instead of pure hexadecimal.
    pub special_chars: bool,
    /// Insert a `-` every [`GROUP_LEN`] characters of the random part.
    pub formatted: bool,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            length: 32,
            prefix: None,
            special_chars: false,
            formatted: false,
        }
    }
}

/// Produce `count` independently random plaintext tokens.
///
/// Each token is `prefix ++ random-part`; the separator formatting applies to
/// the random part only, after prefixing, so an explicit prefix survives
/// verbatim at the start of the token.
pub fn generate_tokens(count: usize, policy: &TokenPolicy) -> Vec<String> {
    (0..count).map(|i| generate_one(i, policy)).collect()
}

fn generate_one(index: usize, policy: &TokenPolicy) -> String {
    let alphabet = if policy.special_chars {
        WIDE_ALPHABET
    } else {
        HEX_ALPHABET
    };

    let mut random_part = String::with_capacity(policy.length + policy.length / GROUP_LEN);
    for pos in 0..policy.length {
        if policy.formatted && pos > 0 && pos % GROUP_LEN == 0 {
            random_part.push('-');
        }
        let idx = OsRng.gen_range(0..alphabet.len());
        random_part.push(alphabet[idx] as char);
    }

    match &policy.prefix {
        Some(prefix) => format!("{prefix}{random_part}"),
        None => format!("key{index}-{random_part}"),
    }
}

/// Errors surfaced by a [`TokenStore`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A single write to the backing store failed.
    #[error("store write failed: {0}")]
    Write(String),

    /// Listing the backing store failed.
    #[error("store list failed: {0}")]
    List(String),
}

/// The key-value store collaborator holding the envelope set.
///
/// The serialised envelope is the stored *name*; the value is an opaque
/// presence marker the core never inspects. Implementations live in the
/// binaries (S3 in production, an in-memory double in tests).
pub trait TokenStore {
    /// Persist `name` as present in the store.
    async fn put(&self, name: &str) -> Result<(), StoreError>;

    /// List all stored names, in the store's iteration order.
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// A per-item failure during [`encrypt_and_persist`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Sealing the token into an envelope failed.
    #[error(transparent)]
    Encrypt(#[from] EnvelopeError),

    /// The store rejected the envelope write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of persisting one token: the plaintext and either its envelope or
/// the reason it could not be stored.
#[derive(Debug, Clone)]
pub struct TokenUpload {
    /// The plaintext token this entry is about.
    pub token: String,
    /// `Ok(serialised envelope)` on success, the per-item error otherwise.
    pub outcome: Result<String, LifecycleError>,
}

/// Terminal state of a rotation or upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    /// Every persist succeeded (trivially true for an empty batch).
    Completed,
    /// At least one persist succeeded and at least one failed.
    PartiallyFailed,
    /// Every persist failed.
    Failed,
}

impl std::fmt::Display for RotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RotationStatus::Completed => "completed",
            RotationStatus::PartiallyFailed => "partially-failed",
            RotationStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Aggregate result of a rotation: per-item outcomes plus derived status.
#[derive(Debug, Clone)]
pub struct RotationReport {
    /// One entry per generated token, in generation order.
    pub uploads: Vec<TokenUpload>,
}

impl RotationReport {
    /// Derive the batch status from the per-item outcomes.
    pub fn status(&self) -> RotationStatus {
        let failed = self.uploads.iter().filter(|u| u.outcome.is_err()).count();
        let succeeded = self.uploads.len() - failed;
        match (succeeded, failed) {
            (_, 0) => RotationStatus::Completed,
            (0, _) => RotationStatus::Failed,
            _ => RotationStatus::PartiallyFailed,
        }
    }

    /// Entries whose envelope reached the store.
    pub fn succeeded(&self) -> Vec<&TokenUpload> {
        self.uploads.iter().filter(|u| u.outcome.is_ok()).collect()
    }

    /// Entries that failed to persist, with their reasons.
    pub fn failed(&self) -> Vec<&TokenUpload> {
        self.uploads.iter().filter(|u| u.outcome.is_err()).collect()
    }
}

/// Seal each token under `key` and write the envelope to `store`.
///
/// Items are processed strictly in order, one at a time. A failing item is
/// recorded and the loop continues — one bad upload never aborts the rest.
pub async fn encrypt_and_persist<S: TokenStore>(
    tokens: &[String],
    key: &EncryptionKey,
    store: &S,
) -> Vec<TokenUpload> {
    let mut uploads = Vec::with_capacity(tokens.len());
    for token in tokens {
        let outcome = persist_one(token, key, store).await;
        uploads.push(TokenUpload {
            token: token.clone(),
            outcome,
        });
    }
    uploads
}

async fn persist_one<S: TokenStore>(
    token: &str,
    key: &EncryptionKey,
    store: &S,
) -> Result<String, LifecycleError> {
    let envelope = Envelope::encrypt(token, key)?.to_hex();
    store.put(&envelope).await?;
    Ok(envelope)
}

/// The rotation workflow: generate `count` new tokens, persist their
/// envelopes, report per-item results.
///
/// Prior envelopes are untouched — the new tokens become valid alongside the
/// old ones.
pub async fn rotate<S: TokenStore>(
    count: usize,
    policy: &TokenPolicy,
    key: &EncryptionKey,
    store: &S,
) -> RotationReport {
    let tokens = generate_tokens(count, policy);
    let uploads = encrypt_and_persist(&tokens, key, store).await;
    RotationReport { uploads }
}
