//! 请求校验基础设施层

pub mod request_validator;

pub use request_validator::PushRequestValidatorImpl;

use anyhow::Result;

use crate::domain::model::PushRequest;

/// 推送请求校验器 trait
pub trait PushRequestValidator: Send + Sync {
    /// 校验生成的推送请求是否满足协议约束
    fn validate(&self, request: &PushRequest) -> Result<()>;
}
