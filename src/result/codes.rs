//! Fixed status code table shared by the client and the platform.

use std::fmt;

/// A (status, message) pair from the platform's result code table
///
/// Messages are the platform's own text, so envelopes built locally read the
/// same as envelopes returned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode {
    status: &'static str,
    msg: &'static str,
}

impl ResultCode {
    /// Operation succeeded
    pub const SUCCESS: Self = Self::new("M0200", "操作成功");
    /// Rate limited by the platform
    pub const TOO_MANY_REQUESTS: Self = Self::new("M0429", "请求次数过多，请稍后重试");
    /// Request type not accepted by the platform
    pub const UNSUPPORTED_REQUEST_TYPE: Self = Self::new("M0430", "不支持的请求类型");
    /// Generic failure, system busy
    pub const FAILED: Self = Self::new("M0500", "系统繁忙，请稍后重试");
    /// Parameter validation failed
    pub const VALIDATE_FAILED: Self = Self::new("M0555", "参数校验失败");
    /// The third-party HTTP call could not be completed
    pub const CALL_FAILED: Self = Self::new("M0511", "三方服务调用失败");
    /// Interface metadata lookup failed
    pub const GET_INTERFACE_INFO_FAILED: Self = Self::new("M0512", "获取接口信息失败");
    /// Response body could not be converted
    pub const RESPONSE_CONVERSION_ERROR: Self = Self::new("M0513", "响应信息转换失败");
    /// A required request parameter is missing or invalid
    pub const REQUEST_PARAM_NOT_NULL: Self = Self::new("M0514", "接口请求参数不能为空");
    /// A required request header is missing
    pub const REQUEST_HEADER_NOT_NULL: Self = Self::new("M0515", "接口请求头不能为空");

    /// Every code in the table
    pub const ALL: [Self; 10] = [
        Self::SUCCESS,
        Self::TOO_MANY_REQUESTS,
        Self::UNSUPPORTED_REQUEST_TYPE,
        Self::FAILED,
        Self::VALIDATE_FAILED,
        Self::CALL_FAILED,
        Self::GET_INTERFACE_INFO_FAILED,
        Self::RESPONSE_CONVERSION_ERROR,
        Self::REQUEST_PARAM_NOT_NULL,
        Self::REQUEST_HEADER_NOT_NULL,
    ];

    const fn new(status: &'static str, msg: &'static str) -> Self {
        Self { status, msg }
    }

    /// Status code, e.g. `M0200`
    #[must_use]
    pub const fn status(&self) -> &'static str {
        self.status
    }

    /// Human-readable message
    #[must_use]
    pub const fn msg(&self) -> &'static str {
        self.msg
    }

    /// Look up a code by its status string
    #[must_use]
    pub fn from_status(status: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.status == status)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_statuses_are_unique() {
        let statuses: HashSet<_> = ResultCode::ALL.iter().map(ResultCode::status).collect();
        assert_eq!(statuses.len(), ResultCode::ALL.len());
    }

    #[test]
    fn test_known_statuses() {
        assert_eq!(ResultCode::SUCCESS.status(), "M0200");
        assert_eq!(ResultCode::TOO_MANY_REQUESTS.status(), "M0429");
        assert_eq!(ResultCode::UNSUPPORTED_REQUEST_TYPE.status(), "M0430");
        assert_eq!(ResultCode::FAILED.status(), "M0500");
        assert_eq!(ResultCode::VALIDATE_FAILED.status(), "M0555");
        assert_eq!(ResultCode::CALL_FAILED.status(), "M0511");
        assert_eq!(ResultCode::GET_INTERFACE_INFO_FAILED.status(), "M0512");
        assert_eq!(ResultCode::RESPONSE_CONVERSION_ERROR.status(), "M0513");
        assert_eq!(ResultCode::REQUEST_PARAM_NOT_NULL.status(), "M0514");
        assert_eq!(ResultCode::REQUEST_HEADER_NOT_NULL.status(), "M0515");
    }

    #[test]
    fn test_from_status() {
        assert_eq!(ResultCode::from_status("M0511"), Some(ResultCode::CALL_FAILED));
        assert_eq!(ResultCode::from_status("M9999"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResultCode::SUCCESS.to_string(), "M0200 操作成功");
    }

    #[test]
    fn test_messages_match_platform_table() {
        assert_eq!(ResultCode::CALL_FAILED.msg(), "三方服务调用失败");
        assert_eq!(ResultCode::RESPONSE_CONVERSION_ERROR.msg(), "响应信息转换失败");
        assert_eq!(ResultCode::REQUEST_PARAM_NOT_NULL.msg(), "接口请求参数不能为空");
        assert!(ResultCode::ALL.iter().all(|code| !code.msg().is_empty()));
    }
}
