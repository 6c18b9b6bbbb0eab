//! Candidate-token validation against the stored envelope set.
//!
//! There is no index: GCM ciphertext is non-deterministic, so an envelope
//! cannot be looked up by equality. Validation is a linear scan over the set,
//! decrypting each entry and comparing plaintext. The O(n) cost is intrinsic
//! to the encryption scheme, not a shortcut.

use crate::envelope::Envelope;
use crate::keyfmt::EncryptionKey;

/// Returns `true` iff some stored envelope decrypts under `key` to exactly
/// `candidate`.
///
/// Entries are scanned in the supplied order. A malformed entry and an entry
/// whose tag fails to verify are treated identically: not a match, continue
/// with the next entry. Neither condition is observable to the caller — the
/// only output is the final boolean. The scan short-circuits on the first
/// match; an empty set yields `false`.
pub fn validate(candidate: &str, stored: &[String], key: &EncryptionKey) -> bool {
    stored
        .iter()
        .any(|entry| matches_entry(candidate, entry, key))
}

/// One entry of the scan: parse, decrypt, compare. Any failure is a non-match.
fn matches_entry(candidate: &str, serialized: &str, key: &EncryptionKey) -> bool {
    match Envelope::parse(serialized).and_then(|e| e.decrypt(key)) {
        Ok(plaintext) => plaintext == candidate,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seal(token: &str, key: &EncryptionKey) -> String {
        Envelope::encrypt(token, key).unwrap().to_hex()
    }

    #[test]
    fn empty_set_never_matches() {
        let key = EncryptionKey::generate();
        assert!(!validate("anything", &[], &key));
    }

    #[test]
    fn member_of_set_matches() {
        let key = EncryptionKey::generate();
        let stored = vec![
            seal("token-one", &key),
            seal("token-two", &key),
            seal("token-three", &key),
        ];
        assert!(validate("token-two", &stored, &key));
    }

    #[test]
    fn stranger_does_not_match() {
        let key = EncryptionKey::generate();
        let stored = vec![
            seal("token-one", &key),
            seal("token-two", &key),
            seal("token-three", &key),
        ];
        assert!(!validate("token-four", &stored, &key));
    }

    #[test]
    fn match_survives_unrelated_entries() {
        let key = EncryptionKey::generate();
        let other = EncryptionKey::generate();
        let stored = vec![
            seal("decoy-a", &key),
            seal("wrong-key-entry", &other),
            seal("the-real-token", &key),
        ];
        assert!(validate("the-real-token", &stored, &key));
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let key = EncryptionKey::generate();
        let stored = vec![
            "not hex at all".to_owned(),
            "abcd".to_owned(),
            seal("the-real-token", &key),
        ];
        assert!(validate("the-real-token", &stored, &key));
    }

    #[test]
    fn corrupted_entry_before_match_is_skipped() {
        let key = EncryptionKey::generate();
        let mut corrupted = seal("the-real-token", &key);
        // Flip the last hex digit so the tag check fails.
        let flipped = if corrupted.ends_with('0') { '1' } else { '0' };
        corrupted.pop();
        corrupted.push(flipped);
        let stored = vec![corrupted, seal("the-real-token", &key)];
        assert!(validate("the-real-token", &stored, &key));
    }

    #[test]
    fn wrong_validation_key_rejects_everything() {
        let key = EncryptionKey::generate();
        let other = EncryptionKey::generate();
        let stored = vec![seal("token-one", &key)];
        assert!(!validate("token-one", &stored, &other));
    }

    #[test]
    fn scan_short_circuits_on_first_match() {
        let key = EncryptionKey::generate();
        // A malformed trailing entry after the match must never matter.
        let stored = vec![seal("hit", &key), "garbage".to_owned()];
        assert!(validate("hit", &stored, &key));
    }
}
