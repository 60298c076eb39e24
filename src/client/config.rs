//! # Client Configuration Module
//!
//! Settings needed to build an [`OpenPlatformClient`](super::OpenPlatformClient)
//! outside of code: application identity, target URL, public key location and
//! transport behaviour.
//!
//! ## Configuration Sources
//!
//! Configuration can be loaded from (in order of precedence):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Default values
//!
//! ## Security Considerations
//!
//! - The application secret is sent only inside the encrypted `secure` token
//! - Certificate verification is disabled by default; validation logs a
//!   warning whenever it is

use crate::client::endpoint::validate_request_url;
use crate::crypto::AlgorithmType;
use crate::error::{Result, SdkError};
use clap::{ArgAction, Parser};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{metadata::ParseLevelError, Level};

/// Wrapper for `tracing::Level` with serde support
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogLevel(Level);

impl LogLevel {
    /// Returns the inner `tracing::Level` value.
    #[must_use]
    pub fn inner(&self) -> Level {
        self.0
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        Self(level)
    }
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        log_level.0
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s.parse().map_err(serde::de::Error::custom)?))
    }
}

/// Client settings loadable from flags and environment variables
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "open-sdk",
    about = "Send an encrypted, signed request to the open platform",
    version,
    long_about = None
)]
pub struct ClientConfig {
    /// Application key issued by the platform console
    #[arg(
        short = 'k',
        long = "app-key",
        value_name = "KEY",
        default_value = "",
        env = "OPEN_SDK_APP_KEY",
        help = "Application key"
    )]
    pub app_key: String,

    /// Application secret issued by the platform console
    ///
    /// Only ever transmitted inside the encrypted `secure` header.
    #[arg(
        short = 's',
        long = "app-secret",
        value_name = "SECRET",
        default_value = "",
        env = "OPEN_SDK_APP_SECRET",
        hide_env_values = true,
        help = "Application secret"
    )]
    pub app_secret: String,

    /// Interface URL handed out by the platform console
    ///
    /// Rewritten to the submission endpoint before sending.
    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        default_value = "",
        env = "OPEN_SDK_REQUEST_URL",
        help = "Interface URL"
    )]
    pub request_url: String,

    /// Path to the platform RSA public key in PEM format
    #[arg(
        short = 'p',
        long = "public-key",
        value_name = "PATH",
        default_value = crate::DEFAULT_PUBLIC_KEY_PATH,
        env = "OPEN_SDK_PUBLIC_KEY_PATH",
        help = "Path to the platform public key (PEM)"
    )]
    pub public_key_path: PathBuf,

    /// Algorithm announced in the `algorithm` header
    #[arg(
        short = 'a',
        long = "algorithm",
        value_name = "NAME",
        default_value = "RSA",
        env = "OPEN_SDK_ALGORITHM",
        help = "Request algorithm (only RSA is implemented)"
    )]
    pub algorithm: AlgorithmType,

    /// Product case label forwarded to the platform
    #[arg(
        long = "product-case",
        value_name = "LABEL",
        default_value = "",
        env = "OPEN_SDK_PRODUCT_CASE",
        help = "Product case label"
    )]
    pub product_case: String,

    /// Report flag forwarded to the platform
    #[arg(long = "report", env = "OPEN_SDK_REPORT", help = "Mark the request as a report")]
    pub report: bool,

    /// HTTP timeout in milliseconds
    #[arg(
        short = 't',
        long = "timeout-ms",
        value_name = "MILLISECONDS",
        default_value_t = crate::REQUEST_TIMEOUT_MS,
        env = "OPEN_SDK_TIMEOUT_MS",
        help = "HTTP timeout in milliseconds"
    )]
    pub timeout_ms: u64,

    /// Skip server certificate verification
    ///
    /// Defaults to `true` for compatibility with platform environments that
    /// use private certificates.
    #[arg(
        long = "accept-invalid-certs",
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set,
        env = "OPEN_SDK_ACCEPT_INVALID_CERTS",
        help = "Skip server certificate verification (true/false)"
    )]
    pub accept_invalid_certs: bool,

    /// Logging level for the command-line tool
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        env = "LOG_LEVEL",
        help = "Logging level (error, warn, info, debug, trace)"
    )]
    pub log_level: LogLevel,
}

impl ClientConfig {
    /// Load configuration from environment variables only
    ///
    /// Unset variables keep their default values.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(app_key) = std::env::var("OPEN_SDK_APP_KEY") {
            config.app_key = app_key;
        }

        if let Ok(app_secret) = std::env::var("OPEN_SDK_APP_SECRET") {
            config.app_secret = app_secret;
        }

        if let Ok(request_url) = std::env::var("OPEN_SDK_REQUEST_URL") {
            config.request_url = request_url;
        }

        if let Ok(key_path) = std::env::var("OPEN_SDK_PUBLIC_KEY_PATH") {
            config.public_key_path = PathBuf::from(key_path);
        }

        if let Ok(algorithm) = std::env::var("OPEN_SDK_ALGORITHM") {
            config.algorithm = algorithm.parse().unwrap_or_default();
        }

        if let Ok(product_case) = std::env::var("OPEN_SDK_PRODUCT_CASE") {
            config.product_case = product_case;
        }

        if let Ok(report) = std::env::var("OPEN_SDK_REPORT") {
            config.report = report.parse().map_err(|e| {
                SdkError::config_error(
                    format!("Invalid report flag '{report}': {e}"),
                    Some(Box::new(e)),
                )
            })?;
        }

        if let Ok(timeout) = std::env::var("OPEN_SDK_TIMEOUT_MS") {
            config.timeout_ms = timeout.parse().map_err(|e| {
                SdkError::config_error(
                    format!("Invalid timeout '{timeout}': {e}"),
                    Some(Box::new(e)),
                )
            })?;
        }

        if let Ok(accept) = std::env::var("OPEN_SDK_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = accept.parse().map_err(|e| {
                SdkError::config_error(
                    format!("Invalid accept invalid certs '{accept}': {e}"),
                    Some(Box::new(e)),
                )
            })?;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.log_level = log_level.parse().map_err(|e| {
                SdkError::config_error(
                    format!("Invalid log level '{log_level}': {e}"),
                    Some(Box::new(e)),
                )
            })?;
        }

        Ok(config)
    }

    /// Validate the configuration before any request is built
    ///
    /// ## Errors
    /// - `SdkError::ConfigError`: missing identity, missing key file or zero timeout
    /// - `SdkError::RequestError`: empty or malformed request URL
    pub fn validate(&self) -> Result<()> {
        if self.app_key.is_empty() {
            return Err(SdkError::config_error("Application key cannot be empty", None));
        }

        if self.app_secret.is_empty() {
            return Err(SdkError::config_error(
                "Application secret cannot be empty",
                None,
            ));
        }

        validate_request_url(&self.request_url)?;

        if !self.public_key_path.is_file() {
            return Err(SdkError::config_error(
                format!(
                    "Public key file does not exist: {}",
                    self.public_key_path.display()
                ),
                None,
            ));
        }

        if self.timeout_ms == 0 {
            return Err(SdkError::config_error("Request timeout cannot be zero", None));
        }

        if !self.algorithm.is_supported() {
            tracing::warn!(
                "Algorithm {} is not implemented - requests will be rejected before sending",
                self.algorithm
            );
        }

        if self.accept_invalid_certs {
            tracing::warn!(
                "Server certificate verification is disabled, use only with trusted endpoints"
            );
        }

        Ok(())
    }

    /// HTTP timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            request_url: String::new(),
            public_key_path: PathBuf::from(crate::DEFAULT_PUBLIC_KEY_PATH),
            algorithm: AlgorithmType::Rsa,
            product_case: String::new(),
            report: false,
            timeout_ms: crate::REQUEST_TIMEOUT_MS,
            accept_invalid_certs: true,
            log_level: LogLevel::from(Level::INFO),
        }
    }
}
