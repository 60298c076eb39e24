//! # Open Platform Client Module
//!
//! [`OpenPlatformClient`] holds one application's identity, the target URL,
//! the request data and transport settings. [`OpenPlatformClient::send`] runs
//! the whole pipeline: validate the URL, derive the submission endpoint,
//! encrypt the serialized client, sign the identity, POST, decode.
//!
//! ## Wire Format
//!
//! ```text
//! POST <base>/api-app/sdk/request
//! Content-Type: application/json
//! algorithm: RSA
//! secure: <base64 signature token>
//! <caller headers>
//!
//! {"encryptData": "<base64 ciphertext>"}
//! ```
//!
//! Caller headers are applied last and replace framework headers with the
//! same name, `secure` and `algorithm` included.

pub mod config;
pub mod endpoint;
pub mod timing;
pub mod transport;

pub use config::ClientConfig;
pub use endpoint::derive_endpoint;
pub use timing::RequestTimer;
pub use transport::HttpTransport;

use crate::crypto::{AlgorithmType, CryptoService, KeySource};
use crate::error::{Result, SdkError};
use crate::result::BaseResult;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Header carrying the algorithm name
pub const ALGORITHM_HEADER: &str = "algorithm";

/// Header carrying the signature token
pub const SECURE_HEADER: &str = "secure";

/// Client for one open platform interface
///
/// `T` is the request data type; anything `Serialize` works, from a string
/// to a map to a user struct.
#[derive(Debug, Clone)]
pub struct OpenPlatformClient<T = serde_json::Value> {
    app_key: String,
    app_secret: String,
    request_url: String,
    request_data: Option<T>,
    headers: BTreeMap<String, String>,
    algorithm_type: AlgorithmType,
    is_report: bool,
    product_case: String,
    key_source: KeySource,
    timeout: Duration,
    accept_invalid_certs: bool,
}

/// JSON document that gets encrypted into `encryptData`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPayload<'a, T> {
    app_key: &'a str,
    app_secret: &'a str,
    request_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_data: Option<&'a T>,
    #[serde(rename = "header", skip_serializing_if = "no_headers")]
    headers: &'a BTreeMap<String, String>,
    algorithm_type: &'a AlgorithmType,
    is_report: bool,
    product_case: &'a str,
}

fn no_headers(headers: &&BTreeMap<String, String>) -> bool {
    headers.is_empty()
}

/// Body actually placed on the wire
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncryptedBody {
    encrypt_data: String,
}

impl<T> OpenPlatformClient<T> {
    /// Client for `request_url` using RSA and the default key location
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        request_url: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            request_url: request_url.into(),
            request_data: None,
            headers: BTreeMap::new(),
            algorithm_type: AlgorithmType::Rsa,
            is_report: false,
            product_case: String::new(),
            key_source: KeySource::default(),
            timeout: Duration::from_millis(crate::REQUEST_TIMEOUT_MS),
            accept_invalid_certs: true,
        }
    }

    /// Client built from a loaded configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut client = Self::new(
            config.app_key.clone(),
            config.app_secret.clone(),
            config.request_url.clone(),
        );
        client
            .set_algorithm_type(config.algorithm.clone())
            .set_report(config.report)
            .set_product_case(config.product_case.clone())
            .with_public_key(KeySource::Path(config.public_key_path.clone()))
            .with_timeout(config.timeout())
            .with_accept_invalid_certs(config.accept_invalid_certs);
        client
    }

    /// Set the request data
    pub fn set_data(&mut self, data: T) -> &mut Self {
        self.request_data = Some(data);
        self
    }

    /// Replace the custom headers
    pub fn set_header<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Select the algorithm
    pub fn set_algorithm_type(&mut self, algorithm_type: AlgorithmType) -> &mut Self {
        self.algorithm_type = algorithm_type;
        self
    }

    /// Set the report flag
    pub fn set_report(&mut self, is_report: bool) -> &mut Self {
        self.is_report = is_report;
        self
    }

    /// Set the product case label
    pub fn set_product_case(&mut self, product_case: impl Into<String>) -> &mut Self {
        self.product_case = product_case.into();
        self
    }

    /// Where to read the platform public key from
    pub fn with_public_key(&mut self, key_source: KeySource) -> &mut Self {
        self.key_source = key_source;
        self
    }

    /// HTTP timeout
    pub fn with_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Whether to skip server certificate verification (default `true`)
    pub fn with_accept_invalid_certs(&mut self, accept: bool) -> &mut Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Application key
    #[must_use]
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Target URL as supplied
    #[must_use]
    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    /// Request data, if set
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.request_data.as_ref()
    }

    /// Custom headers
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Selected algorithm
    #[must_use]
    pub fn algorithm_type(&self) -> &AlgorithmType {
        &self.algorithm_type
    }

    fn payload(&self) -> RequestPayload<'_, T> {
        RequestPayload {
            app_key: &self.app_key,
            app_secret: &self.app_secret,
            request_url: &self.request_url,
            request_data: self.request_data.as_ref(),
            headers: &self.headers,
            algorithm_type: &self.algorithm_type,
            is_report: self.is_report,
            product_case: &self.product_case,
        }
    }

    /// Framework headers followed by caller headers, last write wins
    fn build_headers(&self, secure: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ALGORITHM_HEADER, header_value(self.algorithm_type.as_str())?);
        headers.insert(SECURE_HEADER, header_value(secure)?);

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SdkError::request_error(format!("invalid header name `{name}`: {e}"))
            })?;
            if headers.contains_key(&header_name) {
                debug!("Custom header `{}` replaces a framework header", name);
            }
            headers.insert(header_name, header_value(value)?);
        }

        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| SdkError::request_error(format!("invalid header value: {e}")))
}

impl<T: Serialize> OpenPlatformClient<T> {
    /// Send the request and return the platform's result envelope
    ///
    /// Never fails: local validation, crypto, transport and decoding errors
    /// all come back as a `BaseResult` with the matching status code.
    #[instrument(
        level = "info",
        name = "open_sdk_send",
        skip(self),
        fields(app_key = %self.app_key, algorithm = %self.algorithm_type)
    )]
    pub async fn send(&self) -> BaseResult {
        let mut timer = RequestTimer::new();
        timer.start_timing();

        let result = match self.try_send().await {
            Ok(result) => {
                info!("Request response: {}", result);
                result
            }
            Err(e) => {
                let status = e.result_code().status();
                if e.is_critical() {
                    error!(status, "Request failed: {}", e.internal_message());
                } else {
                    warn!(status, "Request rejected: {}", e);
                }
                BaseResult::from(e)
            }
        };

        timer.log_completion(&result.status, &self.request_url);
        result
    }

    async fn try_send(&self) -> Result<BaseResult> {
        let endpoint = derive_endpoint(&self.request_url)?;
        debug!("Derived submission endpoint {}", endpoint);

        let crypto = CryptoService::new(self.key_source.clone());

        let plaintext = serde_json::to_string(&self.payload())?;
        let encrypt_data = crypto.encrypt_payload(&plaintext)?;
        let secure = crypto.sign(&self.app_key, &self.app_secret, &self.algorithm_type)?;

        let headers = self.build_headers(&secure)?;
        let body = serde_json::to_string(&EncryptedBody { encrypt_data })?;

        let transport = HttpTransport::new(self.timeout, self.accept_invalid_certs)?;
        transport.post(&endpoint, headers, body).await
    }
}

impl<T: fmt::Debug> fmt::Display for OpenPlatformClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OpenPlatformClient{{AppKey:{}, AppSecret:***, RequestUrl:{}, RequestData:{:?}, \
             Headers:{:?}, AlgorithmType:{}, IsReport:{}, ProductCase:{}}}",
            self.app_key,
            self.request_url,
            self.request_data,
            self.headers,
            self.algorithm_type,
            self.is_report,
            self.product_case
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn client() -> OpenPlatformClient<HashMap<&'static str, &'static str>> {
        OpenPlatformClient::new("app-key", "app-secret", "https://open.yljr.com/a/b/c")
    }

    #[test]
    fn test_defaults() {
        let client = client();
        assert_eq!(client.app_key(), "app-key");
        assert_eq!(client.algorithm_type(), &AlgorithmType::Rsa);
        assert!(client.data().is_none());
        assert!(client.headers().is_empty());
        assert!(client.accept_invalid_certs);
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_payload_field_names() {
        let mut client = client();
        client
            .set_data(HashMap::from([("param1", "value1")]))
            .set_header([("x-trace", "1")])
            .set_report(true)
            .set_product_case("loan");

        let value = serde_json::to_value(client.payload()).unwrap();
        assert_eq!(
            value,
            json!({
                "appKey": "app-key",
                "appSecret": "app-secret",
                "requestUrl": "https://open.yljr.com/a/b/c",
                "requestData": {"param1": "value1"},
                "header": {"x-trace": "1"},
                "algorithmType": "RSA",
                "isReport": true,
                "productCase": "loan"
            })
        );
    }

    #[test]
    fn test_payload_omits_empty_data_and_headers() {
        let value = serde_json::to_value(client().payload()).unwrap();
        assert!(value.get("requestData").is_none());
        assert!(value.get("header").is_none());
        assert_eq!(value["isReport"], false);
        assert_eq!(value["productCase"], "");
    }

    #[test]
    fn test_set_header_replaces_previous_map() {
        let mut client = client();
        client.set_header([("a", "1")]);
        client.set_header([("b", "2")]);

        assert_eq!(client.headers().len(), 1);
        assert_eq!(client.headers().get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_headers_caller_overrides_framework() {
        let mut client = client();
        client.set_header([("Secure", "caller-token"), ("X-Request-Id", "42")]);

        let headers = client.build_headers("computed-token").unwrap();
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["algorithm"], "RSA");
        assert_eq!(headers["secure"], "caller-token");
        assert_eq!(headers["x-request-id"], "42");
        assert_eq!(headers.get_all("secure").iter().count(), 1);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut client = client();
        client.set_header([("bad header", "x")]);
        assert!(matches!(
            client.build_headers("token"),
            Err(SdkError::RequestError { .. })
        ));

        client.set_header([("x-ok", "line\nbreak")]);
        assert!(matches!(
            client.build_headers("token"),
            Err(SdkError::RequestError { .. })
        ));
    }

    #[test]
    fn test_display_masks_secret() {
        let rendered = client().to_string();
        assert!(rendered.contains("AppKey:app-key"));
        assert!(rendered.contains("AppSecret:***"));
        assert!(!rendered.contains("app-secret"));
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            app_key: "k".to_string(),
            app_secret: "s".to_string(),
            request_url: "https://other.example.com/a/b/c".to_string(),
            algorithm: AlgorithmType::sm2(),
            timeout_ms: 750,
            accept_invalid_certs: false,
            report: true,
            ..ClientConfig::default()
        };

        let client: OpenPlatformClient = OpenPlatformClient::from_config(&config);
        assert_eq!(client.app_key(), "k");
        assert_eq!(client.request_url(), "https://other.example.com/a/b/c");
        assert_eq!(client.algorithm_type(), &AlgorithmType::sm2());
        assert_eq!(client.timeout, Duration::from_millis(750));
        assert!(!client.accept_invalid_certs);
        assert!(client.is_report);
    }

    #[tokio::test]
    async fn test_send_empty_url() {
        let client: OpenPlatformClient = OpenPlatformClient::new("k", "s", "");
        let result = client.send().await;
        assert_eq!(result.status, "M0514");
        assert!(result.msg.contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_send_malformed_url() {
        let client: OpenPlatformClient = OpenPlatformClient::new("k", "s", "open.yljr.com/a/b");
        let result = client.send().await;
        assert_eq!(result.status, "M0514");
        assert!(result.msg.contains("malformed"));
    }

    #[tokio::test]
    async fn test_send_missing_key_file() {
        let mut client: OpenPlatformClient =
            OpenPlatformClient::new("k", "s", "https://open.yljr.com/a/b/c");
        client.with_public_key(KeySource::path("/nonexistent/RSA-PublicKey.pem"));

        let result = client.send().await;
        assert_eq!(result.status, "M0514");
        assert!(result.msg.contains("failed to read public key file"));
    }
}
