//! # Result Envelope
//!
//! Every call through the SDK returns a [`BaseResult`]: a status code from the
//! [`ResultCode`] table, a message and optional data. The same shape is used
//! for results produced locally and for responses decoded from the platform.

pub mod codes;

pub use codes::ResultCode;

use crate::error::SdkError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Uniform `{status, msg, data}` envelope
///
/// Missing `status` and `msg` fields decode as empty strings, and `data` is
/// omitted from the encoded form when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseResult<T = serde_json::Value> {
    /// Status code, e.g. `M0200`
    #[serde(default)]
    pub status: String,
    /// Human-readable message
    #[serde(default)]
    pub msg: String,
    /// Optional payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> BaseResult<T> {
    fn new(status: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            msg: msg.into(),
            data: None,
        }
    }

    /// Plain success
    #[must_use]
    pub fn success() -> Self {
        Self::new(ResultCode::SUCCESS.status(), ResultCode::SUCCESS.msg())
    }

    /// Success carrying data
    #[must_use]
    pub fn success_with_data(data: T) -> Self {
        Self::success().set_data(data)
    }

    /// Plain generic failure
    #[must_use]
    pub fn fail() -> Self {
        Self::new(ResultCode::FAILED.status(), ResultCode::FAILED.msg())
    }

    /// Generic failure carrying data
    #[must_use]
    pub fn fail_with_data(data: T) -> Self {
        Self::fail().set_data(data)
    }

    /// Envelope built from a table entry
    #[must_use]
    pub fn fail_with_result_code(code: ResultCode) -> Self {
        Self::new(code.status(), code.msg())
    }

    /// Envelope with an explicit status and message
    #[must_use]
    pub fn fail_with_code_and_msg(status: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(status, msg)
    }

    pub(crate) fn set_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the status equals the success code
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResultCode::SUCCESS.status()
    }

    /// Table entry matching this status, if the status is a known one
    #[must_use]
    pub fn result_code(&self) -> Option<ResultCode> {
        ResultCode::from_status(&self.status)
    }
}

impl<T> From<SdkError> for BaseResult<T> {
    fn from(err: SdkError) -> Self {
        Self::fail_with_code_and_msg(err.result_code().status(), err.client_message())
    }
}

/// Renders the envelope as a single JSON line, `data` as `null` when absent
impl<T: Serialize> fmt::Display for BaseResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = serde_json::to_string(&self.data).unwrap_or_else(|_| "null".to_string());
        write!(
            f,
            r#"{{"status": {}, "msg": {}, "data": {}}}"#,
            serde_json::Value::from(self.status.as_str()),
            serde_json::Value::from(self.msg.as_str()),
            data
        )
    }
}
