//! # Chunked RSA Encryption
//!
//! PKCS#1 v1.5 can only encrypt `key_size - 11` bytes per operation, so
//! payloads are split into chunks of at most that many bytes. Each chunk is
//! encrypted on its own and the raw ciphertext blocks are concatenated in
//! input order with no separators, then base64 encoded. Every ciphertext
//! block is exactly `key_size` bytes long, which is how the platform splits
//! the blob back apart.

use crate::crypto::key::{load_public_key, KeySource};
use crate::error::{Result, SdkError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use tracing::trace;

/// Bytes of PKCS#1 v1.5 padding overhead per block
pub const PKCS1_V15_PADDING_OVERHEAD: usize = 11;

/// Largest plaintext chunk a key of `key_size` bytes can encrypt
#[must_use]
pub const fn max_chunk_size(key_size: usize) -> usize {
    key_size.saturating_sub(PKCS1_V15_PADDING_OVERHEAD)
}

/// Number of ciphertext blocks produced for `plaintext_len` bytes
#[must_use]
pub fn chunk_count(plaintext_len: usize, key_size: usize) -> usize {
    match max_chunk_size(key_size) {
        0 => 0,
        max => plaintext_len.div_ceil(max),
    }
}

/// Encrypt `plaintext` chunk by chunk and return base64 of the concatenation
///
/// Empty input yields an empty string. A failure on any chunk discards the
/// ciphertext accumulated so far.
///
/// ## Errors
/// `SdkError::EncryptionError` if the key is too small to hold any payload
/// or a chunk fails to encrypt.
pub fn encrypt(plaintext: &str, public_key: &RsaPublicKey) -> Result<String> {
    let key_size = public_key.size();
    let max_chunk = max_chunk_size(key_size);
    if max_chunk == 0 {
        return Err(SdkError::encryption_error(
            format!("{key_size} byte key leaves no room for payload"),
            None,
        ));
    }

    let mut rng = rand::thread_rng();
    let mut ciphertext = Vec::with_capacity(chunk_count(plaintext.len(), key_size) * key_size);

    for (index, chunk) in plaintext.as_bytes().chunks(max_chunk).enumerate() {
        let block = public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, chunk)
            .map_err(|e| {
                SdkError::encryption_error(
                    format!("failed to encrypt chunk {index}: {e}"),
                    Some(Box::new(e)),
                )
            })?;
        ciphertext.extend_from_slice(&block);
    }

    trace!(
        "Encrypted {} plaintext bytes into {} ciphertext bytes",
        plaintext.len(),
        ciphertext.len()
    );

    Ok(BASE64.encode(ciphertext))
}

/// Encryptor bound to a key source
///
/// The key is loaded from the source on every call and never cached.
#[derive(Debug, Clone)]
pub struct RsaEncryptor {
    key_source: KeySource,
}

impl RsaEncryptor {
    /// Create an encryptor reading its key from `key_source`
    #[must_use]
    pub fn new(key_source: KeySource) -> Self {
        Self { key_source }
    }

    /// The configured key source
    #[must_use]
    pub fn key_source(&self) -> &KeySource {
        &self.key_source
    }

    /// Load the key and encrypt `plaintext` with it
    pub fn encrypt_str(&self, plaintext: &str) -> Result<String> {
        let public_key = load_public_key(&self.key_source)?;
        encrypt(plaintext, &public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
    use rsa::RsaPrivateKey;

    const RSA_PUBLIC_KEY: &str = include_str!("../../tests/fixtures/rsa_public.pem");
    const RSA_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/rsa_private.pem");

    fn keys() -> (RsaPublicKey, RsaPrivateKey) {
        (
            RsaPublicKey::from_public_key_pem(RSA_PUBLIC_KEY).unwrap(),
            RsaPrivateKey::from_pkcs8_pem(RSA_PRIVATE_KEY).unwrap(),
        )
    }

    fn decrypt(encoded: &str, private_key: &RsaPrivateKey) -> Vec<u8> {
        let ciphertext = BASE64.decode(encoded).unwrap();
        ciphertext
            .chunks(private_key.size())
            .flat_map(|block| private_key.decrypt(Pkcs1v15Encrypt, block).unwrap())
            .collect()
    }

    fn plaintext_of_len(len: usize) -> String {
        "abcdefghijklmnopqrstuvwxyz0123456789"
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_chunk_size_math() {
        assert_eq!(max_chunk_size(128), 117);
        assert_eq!(max_chunk_size(256), 245);
        assert_eq!(max_chunk_size(8), 0);
        assert_eq!(chunk_count(0, 128), 0);
        assert_eq!(chunk_count(1, 128), 1);
        assert_eq!(chunk_count(117, 128), 1);
        assert_eq!(chunk_count(118, 128), 2);
        assert_eq!(chunk_count(3 * 117 + 5, 128), 4);
    }

    #[test]
    fn test_empty_plaintext() {
        let (public_key, _) = keys();
        assert_eq!(encrypt("", &public_key).unwrap(), "");
    }

    #[test]
    fn test_roundtrip_at_chunk_boundaries() {
        let (public_key, private_key) = keys();
        let max = max_chunk_size(public_key.size());

        for len in [max - 1, max, 3 * max + 5] {
            let plaintext = plaintext_of_len(len);
            let encoded = encrypt(&plaintext, &public_key).unwrap();

            let raw_len = BASE64.decode(&encoded).unwrap().len();
            assert_eq!(
                raw_len,
                chunk_count(len, public_key.size()) * public_key.size(),
                "unexpected ciphertext length for {len} bytes"
            );
            assert_eq!(decrypt(&encoded, &private_key), plaintext.as_bytes());
        }
    }

    #[test]
    fn test_multibyte_text_split_across_chunks() {
        let (public_key, private_key) = keys();
        let plaintext = "支付订单-".repeat(40);

        let encoded = encrypt(&plaintext, &public_key).unwrap();
        let decrypted = String::from_utf8(decrypt(&encoded, &private_key)).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_encryption_is_randomized() {
        let (public_key, _) = keys();
        let first = encrypt("same input", &public_key).unwrap();
        let second = encrypt("same input", &public_key).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_encryptor_reloads_key_source() {
        let (_, private_key) = keys();
        let encryptor = RsaEncryptor::new(KeySource::pem(RSA_PUBLIC_KEY));

        let encoded = encryptor.encrypt_str(r#"{"param1":"value1"}"#).unwrap();
        assert_eq!(decrypt(&encoded, &private_key), br#"{"param1":"value1"}"#);
    }

    #[test]
    fn test_encryptor_surfaces_key_errors() {
        let encryptor = RsaEncryptor::new(KeySource::path("/nonexistent/key.pem"));
        let result = encryptor.encrypt_str("payload");
        assert!(matches!(result, Err(SdkError::KeyError { .. })));
    }
}
