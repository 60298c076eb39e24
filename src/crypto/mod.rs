//! # Cryptographic Operations Module
//!
//! Request protection for the open platform:
//!
//! - [`key`] loads the platform's RSA public key from a caller-supplied source
//! - [`rsa`] encrypts arbitrary-length text in PKCS#1 v1.5 sized chunks
//! - [`signer`] turns the application identity into a timestamped token
//!
//! [`CryptoService`] ties the three together for the request pipeline. It
//! holds no key material; each operation loads the key again.

pub mod key;
pub mod rsa;
pub mod signer;

pub use self::key::{load_public_key, KeySource};
pub use self::rsa::{encrypt, RsaEncryptor};
pub use self::signer::{AlgorithmType, RequestSigner};

use crate::error::Result;

/// Encrypts request bodies and signs request identities
#[derive(Debug, Clone)]
pub struct CryptoService {
    encryptor: RsaEncryptor,
}

impl CryptoService {
    /// Service reading the public key from `key_source`
    #[must_use]
    pub fn new(key_source: KeySource) -> Self {
        Self {
            encryptor: RsaEncryptor::new(key_source),
        }
    }

    /// Encrypt a serialized request body
    pub fn encrypt_payload(&self, plaintext: &str) -> Result<String> {
        self.encryptor.encrypt_str(plaintext)
    }

    /// Compute the `secure` header token for an identity
    ///
    /// The algorithm is checked before the key is touched.
    pub fn sign(
        &self,
        app_key: &str,
        app_secret: &str,
        algorithm: &AlgorithmType,
    ) -> Result<String> {
        if !algorithm.is_supported() {
            return Err(crate::error::SdkError::unsupported_algorithm(
                algorithm.as_str(),
            ));
        }
        let public_key = load_public_key(self.encryptor.key_source())?;
        RequestSigner::new(app_key, app_secret, algorithm).sign(&public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;

    const RSA_PUBLIC_KEY: &str = include_str!("../../tests/fixtures/rsa_public.pem");

    #[test]
    fn test_encrypt_payload() {
        let service = CryptoService::new(KeySource::pem(RSA_PUBLIC_KEY));
        let encoded = service.encrypt_payload(r#"{"appKey":"k"}"#).unwrap();
        assert!(!encoded.is_empty());
    }

    #[test]
    fn test_sign_rejects_sm2_without_reading_key() {
        let service = CryptoService::new(KeySource::path("/nonexistent/key.pem"));
        let result = service.sign("k", "s", &AlgorithmType::sm2());
        assert!(matches!(result, Err(SdkError::UnsupportedAlgorithm { .. })));
    }

    #[test]
    fn test_sign_with_missing_key() {
        let service = CryptoService::new(KeySource::path("/nonexistent/key.pem"));
        let result = service.sign("k", "s", &AlgorithmType::Rsa);
        assert!(matches!(result, Err(SdkError::KeyError { .. })));
    }
}
