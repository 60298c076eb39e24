//! # Error Handling Module
//!
//! Error taxonomy for the open platform client. Every failure raised inside
//! the request pipeline is an [`SdkError`]; at the public `send` boundary it is
//! folded into a [`BaseResult`](crate::result::BaseResult) carrying the
//! matching result code, so callers branch on status codes instead of
//! handling a `Result`.
//!
//! ## Categories
//!
//! - **Local validation**: empty or malformed URL, bad header names
//! - **Cryptographic**: key loading, key parsing and chunk encryption
//! - **Transport**: timeouts, connection and TLS failures
//! - **Response**: the platform answered with something that is not an envelope
//! - **Configuration**: invalid client settings
//!
//! Transport and response errors never expose their underlying text to the
//! caller; it only reaches the logs.

use crate::result::codes::ResultCode;
use thiserror::Error;

/// Result type alias for the SDK
pub type Result<T> = std::result::Result<T, SdkError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while preparing, sending or decoding a platform request
#[derive(Error, Debug)]
pub enum SdkError {
    /// The public key could not be read or parsed
    ///
    /// Covers unreadable key files, missing or mislabeled PEM blocks,
    /// malformed DER payloads and keys of the wrong algorithm.
    #[error("public key error: {message}")]
    KeyError {
        /// Description of what went wrong
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxError>,
    },

    /// A plaintext chunk could not be encrypted
    #[error("encryption failed: {message}")]
    EncryptionError {
        /// Description of what went wrong
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxError>,
    },

    /// The selected algorithm has no implementation
    #[error("unsupported algorithm type: {name}")]
    UnsupportedAlgorithm {
        /// Wire name of the rejected algorithm
        name: String,
    },

    /// The request failed local validation before any network activity
    #[error("invalid request: {message}")]
    RequestError {
        /// Description of the rejected input
        message: String,
    },

    /// The HTTP call itself failed
    ///
    /// Timeouts, refused connections and TLS handshake failures all land
    /// here. No retry is attempted.
    #[error("call failed: {message}")]
    TransportError {
        /// Description for logging
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxError>,
    },

    /// The response body was not a result envelope
    #[error("response conversion failed: {message}")]
    ResponseError {
        /// Description for logging
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxError>,
    },

    /// Client configuration is invalid
    #[error("configuration error: {message}")]
    ConfigError {
        /// Description of the invalid setting
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxError>,
    },
}

impl SdkError {
    /// Create a key loading error
    #[inline]
    pub fn key_error<T>(message: T, source: Option<BoxError>) -> Self
    where
        T: Into<String>,
    {
        Self::KeyError {
            message: message.into(),
            source,
        }
    }

    /// Create an encryption error
    #[inline]
    pub fn encryption_error<T>(message: T, source: Option<BoxError>) -> Self
    where
        T: Into<String>,
    {
        Self::EncryptionError {
            message: message.into(),
            source,
        }
    }

    /// Create an unsupported algorithm error
    #[inline]
    pub fn unsupported_algorithm<T>(name: T) -> Self
    where
        T: Into<String>,
    {
        Self::UnsupportedAlgorithm { name: name.into() }
    }

    /// Create a local validation error
    #[inline]
    pub fn request_error<T>(message: T) -> Self
    where
        T: Into<String>,
    {
        Self::RequestError {
            message: message.into(),
        }
    }

    /// Create a transport error
    #[inline]
    pub fn transport_error<T>(message: T, source: Option<BoxError>) -> Self
    where
        T: Into<String>,
    {
        Self::TransportError {
            message: message.into(),
            source,
        }
    }

    /// Create a response conversion error
    #[inline]
    pub fn response_error<T>(message: T, source: Option<BoxError>) -> Self
    where
        T: Into<String>,
    {
        Self::ResponseError {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn config_error<T>(message: T, source: Option<BoxError>) -> Self
    where
        T: Into<String>,
    {
        Self::ConfigError {
            message: message.into(),
            source,
        }
    }

    /// Result code reported to the caller for this error
    ///
    /// Local validation, configuration and cryptographic failures share the
    /// parameter code `M0514`; transport and response failures have their
    /// own codes.
    #[inline]
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::KeyError { .. }
            | Self::EncryptionError { .. }
            | Self::UnsupportedAlgorithm { .. }
            | Self::RequestError { .. }
            | Self::ConfigError { .. } => ResultCode::REQUEST_PARAM_NOT_NULL,
            Self::TransportError { .. } => ResultCode::CALL_FAILED,
            Self::ResponseError { .. } => ResultCode::RESPONSE_CONVERSION_ERROR,
        }
    }

    /// Message placed in the result envelope
    ///
    /// Local errors carry their own text so the caller can fix the input.
    /// Remote errors return the fixed table message.
    pub fn client_message(&self) -> String {
        match self {
            Self::TransportError { .. } | Self::ResponseError { .. } => {
                self.result_code().msg().to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Detailed message for logs
    #[inline]
    pub fn internal_message(&self) -> &str {
        match self {
            Self::KeyError { message, .. }
            | Self::EncryptionError { message, .. }
            | Self::RequestError { message }
            | Self::TransportError { message, .. }
            | Self::ResponseError { message, .. }
            | Self::ConfigError { message, .. } => message,
            Self::UnsupportedAlgorithm { name } => name,
        }
    }

    /// Whether this error should be logged at ERROR rather than WARN
    #[inline]
    pub fn is_critical(&self) -> bool {
        match self {
            Self::RequestError { .. } | Self::UnsupportedAlgorithm { .. } => false,
            Self::KeyError { .. }
            | Self::EncryptionError { .. }
            | Self::TransportError { .. }
            | Self::ResponseError { .. }
            | Self::ConfigError { .. } => true,
        }
    }
}

impl From<serde_json::Error> for SdkError {
    #[inline]
    fn from(err: serde_json::Error) -> Self {
        Self::request_error(format!("JSON serialization error: {err}"))
    }
}

impl From<reqwest::Error> for SdkError {
    #[inline]
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            format!("HTTP error: {err}")
        };
        Self::transport_error(message, Some(Box::new(err)))
    }
}
