//! Submission endpoint derivation.
//!
//! Callers are handed an interface URL by the platform console. Requests are
//! not sent there directly: the URL is cut back to its origin plus the first
//! two path segments, the gateway host gets an extra `/api` prefix, and the
//! SDK submission path is appended.
//!
//! ```text
//! https://open.yljr.com/foo/bar/baz?q=1  ->  https://open.yljr.com/foo/bar/api/api-app/sdk/request
//! https://other.example.com/a/b/c        ->  https://other.example.com/a/b/api-app/sdk/request
//! ```

use crate::error::{Result, SdkError};
use crate::{GATEWAY_HOST, SUBMIT_PATH};
use reqwest::Url;

/// Number of leading path segments kept from the caller's URL
const KEPT_PATH_SEGMENTS: usize = 2;

/// Check that `request_url` is present and is an absolute http(s) URL
///
/// ## Errors
/// `SdkError::RequestError` for an empty URL, an unparseable URL, a
/// non-http(s) scheme or a URL without a host.
pub fn validate_request_url(request_url: &str) -> Result<Url> {
    if request_url.trim().is_empty() {
        return Err(SdkError::request_error("request url must not be empty"));
    }

    let url = Url::parse(request_url)
        .map_err(|e| SdkError::request_error(format!("request url is malformed: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SdkError::request_error(format!(
            "request url is malformed: unsupported scheme `{}`",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(SdkError::request_error(
            "request url is malformed: missing host",
        ));
    }

    Ok(url)
}

/// Rewrite a caller-supplied URL to the platform submission endpoint
pub fn derive_endpoint(request_url: &str) -> Result<String> {
    let url = validate_request_url(request_url)?;
    let host = url.host_str().unwrap_or_default();

    let mut endpoint = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        endpoint.push_str(&format!(":{port}"));
    }

    let path = url.path();
    let cut = path
        .match_indices('/')
        .nth(KEPT_PATH_SEGMENTS)
        .map_or(path.len(), |(index, _)| index);
    endpoint.push_str(path[..cut].trim_end_matches('/'));

    if url.scheme() == "https" && host == GATEWAY_HOST {
        endpoint.push_str("/api");
    }
    endpoint.push_str(SUBMIT_PATH);

    Ok(endpoint)
}
