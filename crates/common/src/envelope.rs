//! AES-256-GCM envelope encryption of individual tokens.
//!
//! # Envelope wire format
//!
//! ```text
//! hex( IV (16 bytes) ‖ auth tag (16 bytes) ‖ ciphertext )
//! ```
//!
//! One hexadecimal string, no delimiters: the first 32 hex characters are the
//! initialisation vector, the next 32 the 128-bit GCM tag, the remainder the
//! ciphertext. Lowercase is emitted; either case is accepted on decode. GCM
//! is a stream cipher, so the ciphertext is exactly as long as the plaintext
//! and a serialised envelope is never shorter than 64 hex characters.
//!
//! A fresh random IV is drawn for every encryption, so identical
//! plaintext/key pairs never produce the same envelope. That property is why
//! stored envelopes cannot be looked up by equality and must be scanned.

use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Key, Nonce,
};
use thiserror::Error;

use crate::keyfmt::EncryptionKey;

/// AES-256-GCM parameterised with a 128-bit initialisation vector.
type TokenCipher = AesGcm<Aes256, U16>;

/// Byte length of the per-envelope initialisation vector.
pub const IV_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Minimum length of a serialised envelope: IV and tag alone, in hex.
pub const MIN_HEX_LEN: usize = 2 * (IV_LEN + TAG_LEN);

/// Errors produced by the envelope codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The serialised envelope is structurally invalid: shorter than
    /// [`MIN_HEX_LEN`] characters or not pure hexadecimal.
    #[error("malformed envelope")]
    Malformed,

    /// The GCM tag did not verify: wrong key, corrupted ciphertext, or
    /// tampering. Callers must not distinguish this from a non-match.
    #[error("envelope authentication failed")]
    Authentication,

    /// The AEAD encryption operation itself failed.
    #[error("aead operation failed")]
    Aead,
}

/// A parsed envelope: the at-rest representation of one encrypted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Per-encryption random initialisation vector.
    pub iv: [u8; IV_LEN],
    /// 128-bit GCM authentication tag.
    pub tag: [u8; TAG_LEN],
    /// Ciphertext, same length as the plaintext token.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt one plaintext token under `key` with a fresh random IV.
    ///
    /// Additional authenticated data is empty. Two calls with identical
    /// inputs produce different envelopes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Aead`] on an internal AEAD error (unreachable
    /// with a well-formed key and IV).
    pub fn encrypt(plaintext: &str, key: &EncryptionKey) -> Result<Self, EnvelopeError> {
        let cipher = TokenCipher::new(Key::<TokenCipher>::from_slice(key.as_bytes()));

        use aes_gcm::aead::rand_core::RngCore;
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let nonce = Nonce::<U16>::from_slice(&iv);

        // The aead API appends the tag to the ciphertext; the wire format
        // wants it up front, so split it back out.
        let mut sealed = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| EnvelopeError::Aead)?;
        let tag_bytes = sealed.split_off(sealed.len() - TAG_LEN);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&tag_bytes);

        Ok(Self {
            iv,
            tag,
            ciphertext: sealed,
        })
    }

    /// Decrypt this envelope back to the plaintext token.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Authentication`] if the tag does not verify
    /// (wrong key, corruption, tampering) or if the recovered bytes are not
    /// valid UTF-8 — an envelope this system produced always decodes as text.
    pub fn decrypt(&self, key: &EncryptionKey) -> Result<String, EnvelopeError> {
        let cipher = TokenCipher::new(Key::<TokenCipher>::from_slice(key.as_bytes()));
        let nonce = Nonce::<U16>::from_slice(&self.iv);

        let mut sealed = Vec::with_capacity(self.ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(&self.ciphertext);
        sealed.extend_from_slice(&self.tag);

        let plaintext = cipher
            .decrypt(nonce, sealed.as_ref())
            .map_err(|_| EnvelopeError::Authentication)?;
        String::from_utf8(plaintext).map_err(|_| EnvelopeError::Authentication)
    }

    /// Parse a serialised envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] if the string is shorter than
    /// [`MIN_HEX_LEN`] characters or is not pure (even-length) hexadecimal.
    pub fn parse(serialized: &str) -> Result<Self, EnvelopeError> {
        if serialized.len() < MIN_HEX_LEN {
            return Err(EnvelopeError::Malformed);
        }
        let bytes = hex::decode(serialized).map_err(|_| EnvelopeError::Malformed)?;

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&bytes[..IV_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[IV_LEN..IV_LEN + TAG_LEN]);

        Ok(Self {
            iv,
            tag,
            ciphertext: bytes[IV_LEN + TAG_LEN..].to_vec(),
        })
    }

    /// Serialise to the lowercase hex wire format.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(MIN_HEX_LEN + 2 * self.ciphertext.len());
        out.push_str(&hex::encode(self.iv));
        out.push_str(&hex::encode(self.tag));
        out.push_str(&hex::encode(&self.ciphertext));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> EncryptionKey {
        EncryptionKey::generate()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = random_key();
        let envelope = Envelope::encrypt("test-api-key-12345", &key).unwrap();
        assert_eq!(envelope.decrypt(&key).unwrap(), "test-api-key-12345");
    }

    #[test]
    fn serialised_round_trip() {
        let key = random_key();
        let envelope = Envelope::encrypt("some token", &key).unwrap();
        let parsed = Envelope::parse(&envelope.to_hex()).unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(parsed.decrypt(&key).unwrap(), "some token");
    }

    #[test]
    fn two_encryptions_differ() {
        let key = random_key();
        let a = Envelope::encrypt("same plaintext", &key).unwrap();
        let b = Envelope::encrypt("same plaintext", &key).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let k1 = random_key();
        let k2 = random_key();
        let envelope = Envelope::encrypt("test-api-key-12345", &k1).unwrap();
        assert_eq!(envelope.decrypt(&k2), Err(EnvelopeError::Authentication));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = random_key();
        let mut envelope = Envelope::encrypt("tamper me", &key).unwrap();
        envelope.ciphertext[0] ^= 0xFF;
        assert_eq!(envelope.decrypt(&key), Err(EnvelopeError::Authentication));
    }

    #[test]
    fn tampered_tag_fails_authentication() {
        let key = random_key();
        let mut envelope = Envelope::encrypt("tamper me", &key).unwrap();
        envelope.tag[0] ^= 0xFF;
        assert_eq!(envelope.decrypt(&key), Err(EnvelopeError::Authentication));
    }

    #[test]
    fn ciphertext_length_equals_plaintext_length() {
        let key = random_key();
        let plaintext = "0123456789abcdef";
        let envelope = Envelope::encrypt(plaintext, &key).unwrap();
        assert_eq!(envelope.ciphertext.len(), plaintext.len());
        assert_eq!(envelope.to_hex().len(), MIN_HEX_LEN + 2 * plaintext.len());
    }

    #[test]
    fn parse_rejects_short_input() {
        assert_eq!(Envelope::parse(""), Err(EnvelopeError::Malformed));
        assert_eq!(
            Envelope::parse(&"ab".repeat(31)),
            Err(EnvelopeError::Malformed)
        );
    }

    #[test]
    fn parse_rejects_non_hex() {
        let bad = "zz".repeat(40);
        assert_eq!(Envelope::parse(&bad), Err(EnvelopeError::Malformed));
    }

    #[test]
    fn parse_rejects_odd_length() {
        let odd = format!("{}a", "ab".repeat(40));
        assert_eq!(Envelope::parse(&odd), Err(EnvelopeError::Malformed));
    }

    #[test]
    fn parse_accepts_uppercase() {
        let key = random_key();
        let envelope = Envelope::encrypt("case test", &key).unwrap();
        let upper = envelope.to_hex().to_uppercase();
        let parsed = Envelope::parse(&upper).unwrap();
        assert_eq!(parsed.decrypt(&key).unwrap(), "case test");
    }

    #[test]
    fn emitted_hex_is_lowercase() {
        let key = random_key();
        let envelope = Envelope::encrypt("lower", &key).unwrap();
        let hex = envelope.to_hex();
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn iv_and_tag_only_envelope_round_trips() {
        // Empty plaintext: envelope is exactly IV + tag.
        let key = random_key();
        let envelope = Envelope::encrypt("", &key).unwrap();
        assert_eq!(envelope.to_hex().len(), MIN_HEX_LEN);
        assert_eq!(envelope.decrypt(&key).unwrap(), "");
    }
}
