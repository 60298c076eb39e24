//! # Open Platform SDK
//!
//! Client library for calling the open platform API. A request body is
//! serialized to JSON, encrypted with the platform's RSA public key, signed
//! with a timestamped identity token and posted over HTTPS. The reply is
//! decoded into a uniform [`BaseResult`] envelope.
//!
//! ## Architecture
//!
//! - [`error`] - Error taxonomy and its mapping onto result codes
//! - [`crypto`] - Public key loading, chunked RSA encryption and request signing
//! - [`client`] - Client configuration, endpoint derivation and HTTP transport
//! - [`result`] - Result envelope and the fixed result code table
//!
//! ## Request Flow
//!
//! 1. **Validate**: the target URL must be present and well formed
//! 2. **Route**: the URL is rewritten to the platform submission endpoint
//! 3. **Encrypt**: the serialized client is RSA-encrypted in chunks
//! 4. **Sign**: identity and timestamp are encrypted into the `secure` header
//! 5. **Send**: one HTTPS POST, no retries
//! 6. **Decode**: the response body becomes a [`BaseResult`]
//!
//! Failures at any step come back as a [`BaseResult`] with the matching
//! status code; `send` never panics on bad input.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use open_sdk::{KeySource, OpenPlatformClient};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client =
//!         OpenPlatformClient::new("app-key", "app-secret", "https://open.yljr.com/a/b/c");
//!     client
//!         .set_data(HashMap::from([("param1", "value1")]))
//!         .with_public_key(KeySource::path("RSA-PublicKey.pem"));
//!
//!     let result = client.send().await;
//!     println!("{}: {}", result.status, result.msg);
//! }
//! ```
//!
//! ## Security
//!
//! Server certificate verification is disabled by default so that the SDK
//! can reach platform environments with private certificates. Call
//! [`OpenPlatformClient::with_accept_invalid_certs`] with `false` to enable it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod crypto;
pub mod error;
pub mod result;

// Re-export commonly used types for convenience
pub use client::{ClientConfig, OpenPlatformClient};
pub use crypto::{AlgorithmType, KeySource};
pub use error::{Result, SdkError};
pub use result::{BaseResult, ResultCode};

/// Version information for the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Public key file used when no key source is configured
pub const DEFAULT_PUBLIC_KEY_PATH: &str = "RSA-PublicKey.pem";

/// Path appended to the derived base URL to reach the submission endpoint
pub const SUBMIT_PATH: &str = "/api-app/sdk/request";

/// Host that routes SDK traffic through an extra `/api` prefix
pub const GATEWAY_HOST: &str = "open.yljr.com";

/// Timeout for one HTTP call in milliseconds
pub const REQUEST_TIMEOUT_MS: u64 = 5_000;

/// RSA key size in bits below which a warning is logged
pub const MIN_RSA_KEY_SIZE: usize = 2048;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_reasonable() {
        assert!(SUBMIT_PATH.starts_with('/'));
        assert!(!GATEWAY_HOST.contains('/'));
        assert_eq!(REQUEST_TIMEOUT_MS, 5_000);
        assert!(MIN_RSA_KEY_SIZE >= 2048);
    }

    #[test]
    fn test_version_is_valid() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
