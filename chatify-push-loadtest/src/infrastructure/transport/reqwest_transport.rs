use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chatify_load_core::{LoadGenError, Result};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::domain::repositories::{PushTransport, TransportResponse};
use crate::error::TransportError;

/// 基于 reqwest 的推送传输
///
/// 内部 Client 自带连接池，克隆后在所有虚拟用户之间共享
#[derive(Clone)]
pub struct ReqwestPushTransport {
    client: Client,
}

impl ReqwestPushTransport {
    /// 创建带整体超时的传输，超时后连接会被释放
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| {
                LoadGenError::Config(format!("failed to build http client: {}", err))
            })?;
        Ok(Self { client })
    }
}

fn build_headers(
    request_builder: reqwest::RequestBuilder,
    headers: &HashMap<String, String>,
) -> reqwest::RequestBuilder {
    let mut builder = request_builder.header(CONTENT_TYPE, "application/json");
    for (key, value) in headers {
        // Content-Type 固定为 JSON
        if key.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
            debug!(value = %value, "ignoring configured content-type header");
            continue;
        }
        builder = builder.header(key, value);
    }
    builder
}

#[async_trait]
impl PushTransport for ReqwestPushTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        let builder = build_headers(self.client.post(url), headers);
        let response = builder.body(body).send().await?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                debug!(status, error = %err, "failed to read response body");
                String::new()
            }
        };

        Ok(TransportResponse { status, body })
    }
}
