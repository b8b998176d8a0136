//! 推送请求校验器实现

use anyhow::{Result, ensure};

use crate::domain::model::{IdentifierFormat, PushRequest};
use crate::domain::service::{compute_time_window, decode_content};
use crate::domain::service::payload_synthesizer::SynthesizerConfig;

/// 推送请求校验器实现
pub struct PushRequestValidatorImpl {
    content_id_format: IdentifierFormat,
    user_id_format: IdentifierFormat,
    ttl_seconds: i64,
}

impl PushRequestValidatorImpl {
    pub fn new(config: &SynthesizerConfig) -> Self {
        Self {
            content_id_format: config.content_id_format.clone(),
            user_id_format: config.user_id_format.clone(),
            ttl_seconds: config.ttl_seconds,
        }
    }
}

impl Default for PushRequestValidatorImpl {
    fn default() -> Self {
        Self::new(&SynthesizerConfig::default())
    }
}

impl crate::infrastructure::validator::PushRequestValidator for PushRequestValidatorImpl {
    fn validate(&self, request: &PushRequest) -> Result<()> {
        ensure!(
            self.content_id_format.matches(&request.content_id),
            "content_id '{}' does not match format",
            request.content_id
        );

        ensure!(
            self.user_id_format.matches(&request.from_user_id),
            "from_user_id '{}' does not match format",
            request.from_user_id
        );

        let content = decode_content(&request.content)?;
        ensure!(!content.is_empty(), "content cannot be empty");

        ensure!(!request.to_user_ids.is_empty(), "to_user_ids cannot be empty");

        let expire_time = request
            .expire_time_seconds()
            .ok_or_else(|| anyhow::anyhow!("expire_time '{}' is not numeric", request.expire_time))?;
        let expected = compute_time_window(request.timestamp, self.ttl_seconds).expire_time;
        ensure!(
            expire_time == expected,
            "expire_time {} != timestamp {} + ttl {}",
            expire_time,
            request.timestamp,
            self.ttl_seconds
        );

        Ok(())
    }
}
