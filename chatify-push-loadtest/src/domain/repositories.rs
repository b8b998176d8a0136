use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::TransportError;

/// 传输层响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// 推送请求传输
///
/// 每次调用相互独立，实现可以共享连接池
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// 以 `Content-Type: application/json` POST 请求体
    async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError>;
}

/// 时钟（秒级），注入以便测试固定时间
pub trait Clock: Send + Sync {
    fn now_seconds(&self) -> i64;
}
