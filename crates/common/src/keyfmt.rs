//! External representation of the 256-bit token encryption key.
//!
//! The key travels between operators and the secret facility as a 64-character
//! hexadecimal string, optionally grouped with a dash every 8 characters for
//! readability (`ab12cd34-ef56...`). Grouping is cosmetic: parsing strips the
//! dashes, accepts either case, and is idempotent over its own output.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Length of the key's hexadecimal form after separator removal.
pub const KEY_HEX_LEN: usize = 2 * KEY_LEN;

/// Number of hex characters between separators in the formatted form.
const GROUP_LEN: usize = 8;

/// Errors from parsing an externally supplied key string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyFormatError {
    /// After separator removal the string is not exactly [`KEY_HEX_LEN`] characters.
    #[error("encryption key must be {KEY_HEX_LEN} hex characters after separator removal, got {0}")]
    WrongLength(usize),

    /// The string contains characters outside `[0-9a-fA-F]`.
    #[error("encryption key contains non-hexadecimal characters")]
    NotHex,
}

/// A validated 256-bit encryption key.
///
/// The underlying bytes are zeroed when the value is dropped, and `Debug`
/// never prints key material.
#[derive(Clone)]
pub struct EncryptionKey(Zeroizing<[u8; KEY_LEN]>);

impl EncryptionKey {
    /// Parse an external key string: strip `-` separators, require exactly
    /// [`KEY_HEX_LEN`] hex characters (either case), decode to 32 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyFormatError::WrongLength`] or [`KeyFormatError::NotHex`].
    pub fn parse(raw: &str) -> Result<Self, KeyFormatError> {
        let stripped: String = raw.trim().chars().filter(|c| *c != '-').collect();
        if stripped.len() != KEY_HEX_LEN {
            return Err(KeyFormatError::WrongLength(stripped.len()));
        }
        let bytes = hex::decode(&stripped).map_err(|_| KeyFormatError::NotHex)?;
        let mut buf = Zeroizing::new([0u8; KEY_LEN]);
        buf.copy_from_slice(&bytes);
        Ok(Self(buf))
    }

    /// Construct a key directly from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut buf = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(buf.as_mut());
        Self(buf)
    }

    /// Format as lowercase hex with a `-` every [`GROUP_LEN`] characters.
    ///
    /// Purely cosmetic; [`EncryptionKey::parse`] round-trips this exactly.
    pub fn format(&self) -> String {
        let raw = hex::encode(self.0.as_ref());
        let groups: Vec<&str> = raw
            .as_bytes()
            .chunks(GROUP_LEN)
            .map(|c| std::str::from_utf8(c).expect("hex output is ASCII"))
            .collect();
        groups.join("-")
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Returns `true` iff `raw` parses as a valid external key string.
pub fn is_valid(raw: &str) -> bool {
    EncryptionKey::parse(raw).is_ok()
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl Eq for EncryptionKey {}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("EncryptionKey([REDACTED])")
    }
}
