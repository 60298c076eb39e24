//! HTTPS transport for encrypted platform requests.
//!
//! One POST per call. There is no retry and no connection reuse between
//! calls; a failure is reported once, immediately.

use crate::error::{Result, SdkError};
use crate::result::BaseResult;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client configured for one request
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport with the given timeout and certificate policy
    ///
    /// ## Errors
    /// `SdkError::TransportError` if the underlying client cannot be built.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        if accept_invalid_certs {
            warn!("Server certificate verification is disabled for this request");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }

    /// POST `body` to `endpoint` and decode the reply as a result envelope
    ///
    /// The body is decoded whatever the HTTP status; the platform reports
    /// failures through the envelope.
    ///
    /// ## Errors
    /// - `SdkError::TransportError`: timeout, connection or TLS failure
    /// - `SdkError::ResponseError`: the body is not a result envelope
    pub async fn post(
        &self,
        endpoint: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<BaseResult> {
        let response = self
            .client
            .post(endpoint)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let http_status = response.status();
        let bytes = response.bytes().await?;
        debug!(
            "Received HTTP {} with {} byte body from {}",
            http_status,
            bytes.len(),
            endpoint
        );

        serde_json::from_slice::<BaseResult>(&bytes).map_err(|e| {
            SdkError::response_error(
                format!("failed to decode response (HTTP {http_status}): {e}"),
                Some(Box::new(e)),
            )
        })
    }
}
