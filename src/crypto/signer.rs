//! # Request Signing
//!
//! The `secure` header proves which application sent a request. It is the
//! chunk-encrypted JSON of the application identity plus the current time in
//! milliseconds, so every request carries a fresh token.

use crate::crypto::rsa::encrypt;
use crate::error::{Result, SdkError};
use rsa::RsaPublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Wire name of the RSA algorithm
pub const RSA_ALGORITHM: &str = "RSA";

/// Wire name of the SM2 algorithm, declared by the platform but not implemented here
pub const SM2_ALGORITHM: &str = "SM2";

/// Asymmetric algorithm announced in the `algorithm` header
///
/// Only RSA has an implementation. Any other selection is carried by name
/// and rejected when a signature is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AlgorithmType {
    /// RSA with PKCS#1 v1.5 padding
    #[default]
    Rsa,
    /// Any algorithm without an implementation
    Unsupported(String),
}

impl AlgorithmType {
    /// The SM2 selector
    #[must_use]
    pub fn sm2() -> Self {
        Self::Unsupported(SM2_ALGORITHM.to_string())
    }

    /// Name sent in the `algorithm` header
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rsa => RSA_ALGORITHM,
            Self::Unsupported(name) => name,
        }
    }

    /// Whether requests can be signed with this algorithm
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Rsa)
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(RSA_ALGORITHM) {
            Ok(Self::Rsa)
        } else {
            Ok(Self::Unsupported(s.to_ascii_uppercase()))
        }
    }
}

impl Serialize for AlgorithmType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlgorithmType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}

/// Identity header that gets encrypted into the signature token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SecureHeader<'a> {
    app_key: &'a str,
    app_secret: &'a str,
    timestamp: i64,
}

/// Produces `secure` header tokens for one application identity
#[derive(Debug, Clone, Copy)]
pub struct RequestSigner<'a> {
    app_key: &'a str,
    app_secret: &'a str,
    algorithm: &'a AlgorithmType,
}

impl<'a> RequestSigner<'a> {
    /// Signer for the given identity and algorithm
    #[must_use]
    pub fn new(app_key: &'a str, app_secret: &'a str, algorithm: &'a AlgorithmType) -> Self {
        Self {
            app_key,
            app_secret,
            algorithm,
        }
    }

    /// Sign with the current wall-clock time
    pub fn sign(&self, public_key: &RsaPublicKey) -> Result<String> {
        self.sign_at(chrono::Utc::now().timestamp_millis(), public_key)
    }

    /// Sign with an explicit millisecond timestamp
    ///
    /// ## Errors
    /// `SdkError::UnsupportedAlgorithm` unless the algorithm is RSA, or an
    /// encryption error from the chunked encryptor.
    pub fn sign_at(&self, timestamp_ms: i64, public_key: &RsaPublicKey) -> Result<String> {
        if !self.algorithm.is_supported() {
            return Err(SdkError::unsupported_algorithm(self.algorithm.as_str()));
        }

        let header = SecureHeader {
            app_key: self.app_key,
            app_secret: self.app_secret,
            timestamp: timestamp_ms,
        };
        let json = serde_json::to_string(&header)?;
        encrypt(&json, public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
    use rsa::traits::PublicKeyParts;
    use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};

    const RSA_PUBLIC_KEY: &str = include_str!("../../tests/fixtures/rsa_public.pem");
    const RSA_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/rsa_private.pem");

    fn open(token: &str) -> serde_json::Value {
        let private_key = RsaPrivateKey::from_pkcs8_pem(RSA_PRIVATE_KEY).unwrap();
        let raw = BASE64.decode(token).unwrap();
        let plaintext: Vec<u8> = raw
            .chunks(private_key.size())
            .flat_map(|block| private_key.decrypt(Pkcs1v15Encrypt, block).unwrap())
            .collect();
        serde_json::from_slice(&plaintext).unwrap()
    }

    fn public_key() -> RsaPublicKey {
        RsaPublicKey::from_public_key_pem(RSA_PUBLIC_KEY).unwrap()
    }

    #[test]
    fn test_token_contents() {
        let algorithm = AlgorithmType::Rsa;
        let signer = RequestSigner::new("app-key", "app-secret", &algorithm);

        let token = signer.sign_at(1_700_000_000_123, &public_key()).unwrap();
        let header = open(&token);

        assert_eq!(header["appKey"], "app-key");
        assert_eq!(header["appSecret"], "app-secret");
        assert_eq!(header["timestamp"], 1_700_000_000_123_i64);
    }

    #[test]
    fn test_header_field_order() {
        let header = SecureHeader {
            app_key: "k",
            app_secret: "s",
            timestamp: 5,
        };
        assert_eq!(
            serde_json::to_string(&header).unwrap(),
            r#"{"appKey":"k","appSecret":"s","timestamp":5}"#
        );
    }

    #[test]
    fn test_tokens_differ_across_timestamps() {
        let algorithm = AlgorithmType::Rsa;
        let signer = RequestSigner::new("app-key", "app-secret", &algorithm);
        let key = public_key();

        let first = signer.sign_at(1_000, &key).unwrap();
        let second = signer.sign_at(2_000, &key).unwrap();

        assert_ne!(first, second);
        assert_ne!(open(&first)["timestamp"], open(&second)["timestamp"]);
    }

    #[test]
    fn test_sign_uses_current_time() {
        let algorithm = AlgorithmType::Rsa;
        let signer = RequestSigner::new("app-key", "app-secret", &algorithm);

        let before = chrono::Utc::now().timestamp_millis();
        let token = signer.sign(&public_key()).unwrap();
        let after = chrono::Utc::now().timestamp_millis();

        let timestamp = open(&token)["timestamp"].as_i64().unwrap();
        assert!(timestamp >= before && timestamp <= after);
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let algorithm = AlgorithmType::sm2();
        let signer = RequestSigner::new("app-key", "app-secret", &algorithm);

        let result = signer.sign(&public_key());
        match result {
            Err(SdkError::UnsupportedAlgorithm { name }) => assert_eq!(name, "SM2"),
            other => panic!("expected unsupported algorithm, got {other:?}"),
        }
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("RSA".parse::<AlgorithmType>().unwrap(), AlgorithmType::Rsa);
        assert_eq!("rsa".parse::<AlgorithmType>().unwrap(), AlgorithmType::Rsa);
        assert_eq!("sm2".parse::<AlgorithmType>().unwrap(), AlgorithmType::sm2());
        assert_eq!(AlgorithmType::default(), AlgorithmType::Rsa);
        assert_eq!(AlgorithmType::sm2().to_string(), "SM2");
    }

    #[test]
    fn test_algorithm_serde() {
        assert_eq!(serde_json::to_string(&AlgorithmType::Rsa).unwrap(), r#""RSA""#);
        assert_eq!(serde_json::to_string(&AlgorithmType::sm2()).unwrap(), r#""SM2""#);

        let parsed: AlgorithmType = serde_json::from_str(r#""SM2""#).unwrap();
        assert_eq!(parsed, AlgorithmType::sm2());
    }
}
