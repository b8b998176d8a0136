//! 传输层错误定义

use thiserror::Error;

use crate::domain::model::OutcomeErrorKind;

/// 推送请求传输错误
///
/// 这些错误只影响当前迭代，会被记录为失败的 Outcome
#[derive(Debug, Error)]
pub enum TransportError {
    /// 请求超时
    #[error("request timed out: {0}")]
    Timeout(String),

    /// 连接失败（拒绝连接、DNS 解析失败等）
    #[error("connection failed: {0}")]
    Connect(String),

    /// 其他请求错误
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// 对应的 Outcome 错误类型
    pub fn kind(&self) -> OutcomeErrorKind {
        match self {
            TransportError::Timeout(_) => OutcomeErrorKind::Timeout,
            TransportError::Connect(_) => OutcomeErrorKind::Connect,
            TransportError::Request(_) => OutcomeErrorKind::Request,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}
