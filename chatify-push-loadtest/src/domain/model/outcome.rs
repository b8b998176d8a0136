//! 单次迭代的断言结果

use std::time::Duration;

use serde::Serialize;

/// 未拿到可判定响应时的失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeErrorKind {
    Timeout,
    Connect,
    Request,
    Serialization,
}

impl OutcomeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeErrorKind::Timeout => "timeout",
            OutcomeErrorKind::Connect => "connect",
            OutcomeErrorKind::Request => "request",
            OutcomeErrorKind::Serialization => "serialization",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeError {
    pub kind: OutcomeErrorKind,
    pub message: String,
}

/// 单次迭代结果
///
/// 断言失败是正常结果而不是错误；`status_code` 仅在没有收到响应时为 None
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub assertion_name: String,
    pub passed: bool,
    pub status_code: Option<u16>,
    pub latency: Duration,
    pub error: Option<OutcomeError>,
    pub content_id: String,
    pub from_user_id: String,
}

impl Outcome {
    /// 根据响应状态码判定
    pub fn from_status(
        assertion_name: String,
        expected_status: u16,
        status_code: u16,
        latency: Duration,
        content_id: String,
        from_user_id: String,
    ) -> Self {
        Self {
            assertion_name,
            passed: status_code == expected_status,
            status_code: Some(status_code),
            latency,
            error: None,
            content_id,
            from_user_id,
        }
    }

    /// 没有收到响应的失败结果
    pub fn from_error(
        assertion_name: String,
        kind: OutcomeErrorKind,
        message: impl Into<String>,
        latency: Duration,
        content_id: String,
        from_user_id: String,
    ) -> Self {
        Self {
            assertion_name,
            passed: false,
            status_code: None,
            latency,
            error: Some(OutcomeError {
                kind,
                message: message.into(),
            }),
            content_id,
            from_user_id,
        }
    }

    pub fn error_kind(&self) -> Option<OutcomeErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
