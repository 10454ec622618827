//! Content transforms applied by worker nodes.
//!
//! Every transform maps a raw payload to a JSON record ready to be put back
//! on the ring under the task's result key.

use std::collections::HashMap;

use aes_gcm::aead::Aead;
use aes_gcm::aead::AeadCore;
use aes_gcm::aead::KeyInit;
use aes_gcm::aead::OsRng;
use aes_gcm::Aes256Gcm;
use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::error::Error;
use crate::error::Result;

/// Lexical statistics of a text payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordMetrics {
    /// Number of whitespace-separated words.
    pub words: usize,
    /// Integer mean of word lengths, 0 for an empty payload.
    pub average_word_length: usize,
    /// The word occurring most often; earlier words win ties. An empty
    /// payload reports the raw text instead.
    pub most_common_word: String,
}

/// Result of encrypting a payload with a one-off key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// Cipher identifier, `AES-256-GCM`.
    pub algorithm: String,
    /// Base64 of the generated key.
    pub key: String,
    /// Base64 of the nonce used for this payload.
    pub nonce: String,
    /// Base64 of the ciphertext, authentication tag included.
    pub ciphertext: String,
}

/// Result of digesting a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    /// Digest identifier, `SHA-256`.
    pub algorithm: String,
    /// Base64 of the digest bytes.
    pub digest: String,
    /// Digest length in bytes.
    pub length: usize,
}

fn to_json(record: &impl Serialize) -> Result<Bytes> {
    serde_json::to_vec(record)
        .map(Bytes::from)
        .map_err(Error::Serialize)
}

/// Compute lexical statistics over the payload.
pub fn word_metrics(payload: &[u8]) -> Result<Bytes> {
    let text = String::from_utf8_lossy(payload);
    let words: Vec<&str> = text.split_whitespace().collect();

    let average_word_length = if words.is_empty() {
        0
    } else {
        words.iter().map(|word| word.chars().count()).sum::<usize>() / words.len()
    };
    let most_common_word = if words.is_empty() {
        text.to_string()
    } else {
        most_common(&words)
    };

    to_json(&WordMetrics {
        words: words.len(),
        average_word_length,
        most_common_word,
    })
}

fn most_common(words: &[&str]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut best = words[0];
    let mut best_count = 0;
    for &word in words {
        let count = counts.entry(word).or_insert(0);
        *count += 1;
        if *count > best_count {
            best_count = *count;
            best = word;
        }
    }
    best.to_string()
}

/// Encrypt the payload under a freshly generated key, recording key, nonce
/// and ciphertext so the caller can decrypt.
pub fn encrypt(payload: &[u8]) -> Result<Bytes> {
    let key = Aes256Gcm::generate_key(OsRng);
    let cipher = Aes256Gcm::new(&key);
    let nonce = Aes256Gcm::generate_nonce(OsRng);
    let ciphertext = cipher.encrypt(&nonce, payload).map_err(|_| Error::Encrypt)?;

    to_json(&EncryptedRecord {
        algorithm: "AES-256-GCM".to_owned(),
        key: base64::encode(key),
        nonce: base64::encode(nonce),
        ciphertext: base64::encode(ciphertext),
    })
}

/// Digest the payload.
pub fn digest(payload: &[u8]) -> Result<Bytes> {
    let hashed = Sha256::digest(payload);

    to_json(&DigestRecord {
        algorithm: "SHA-256".to_owned(),
        digest: base64::encode(hashed),
        length: hashed.len(),
    })
}

#[cfg(test)]
mod tests {
    use aes_gcm::Nonce;

    use super::*;

    #[test]
    fn test_word_metrics_counts_and_ties() {
        let report = word_metrics(b"the quick the lazy the dog").unwrap();
        let metrics: WordMetrics = serde_json::from_slice(&report).unwrap();
        assert_eq!(metrics.words, 6);
        assert_eq!(metrics.most_common_word, "the");
        // 3 + 5 + 3 + 4 + 3 + 3 = 21 characters over 6 words.
        assert_eq!(metrics.average_word_length, 3);
    }

    #[test]
    fn test_word_metrics_tie_prefers_first_seen() {
        let report = word_metrics(b"alpha beta beta alpha").unwrap();
        let metrics: WordMetrics = serde_json::from_slice(&report).unwrap();
        assert_eq!(metrics.most_common_word, "alpha");
    }

    #[test]
    fn test_word_metrics_empty_payload() {
        let report = word_metrics(b"").unwrap();
        let metrics: WordMetrics = serde_json::from_slice(&report).unwrap();
        assert_eq!(metrics.words, 0);
        assert_eq!(metrics.average_word_length, 0);
        assert_eq!(metrics.most_common_word, "");
    }

    #[test]
    fn test_encrypt_record_decrypts_back() {
        let plaintext = b"attack at dawn".as_slice();
        let record = encrypt(plaintext).unwrap();
        let record: EncryptedRecord = serde_json::from_slice(&record).unwrap();
        assert_eq!(record.algorithm, "AES-256-GCM");

        let key = base64::decode(&record.key).unwrap();
        let nonce = base64::decode(&record.nonce).unwrap();
        let ciphertext = base64::decode(&record.ciphertext).unwrap();
        assert_ne!(ciphertext, plaintext);

        let cipher = Aes256Gcm::new_from_slice(&key).unwrap();
        let decrypted = cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_generates_fresh_keys() {
        let first: EncryptedRecord =
            serde_json::from_slice(&encrypt(b"payload").unwrap()).unwrap();
        let second: EncryptedRecord =
            serde_json::from_slice(&encrypt(b"payload").unwrap()).unwrap();
        assert_ne!(first.key, second.key);
        assert_ne!(first.nonce, second.nonce);
    }

    #[test]
    fn test_digest_matches_direct_hash() {
        let record = digest(b"some bytes").unwrap();
        let record: DigestRecord = serde_json::from_slice(&record).unwrap();
        assert_eq!(record.algorithm, "SHA-256");
        assert_eq!(record.length, 32);
        assert_eq!(record.digest, base64::encode(Sha256::digest(b"some bytes")));
    }
}
