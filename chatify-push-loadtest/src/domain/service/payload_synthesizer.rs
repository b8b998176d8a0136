//! 载荷生成领域服务
//!
//! 所有函数都是纯函数：随机数源与时钟由调用方注入，不读写任何全局可变状态。
//! 每个虚拟用户持有自己的随机数生成器，因此并发生成不需要加锁。

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chatify_load_core::ensure_config;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::model::{IdentifierFormat, PhraseCorpus, PushRequest, PushType};
use crate::domain::repositories::Clock;

/// 默认过期时间：1 天
pub const DEFAULT_TTL_SECONDS: i64 = 86_400;

/// 默认接收方
pub const DEFAULT_TO_USER_ID: &str = "uidhSSWsdYgB9";

/// 从语料库中均匀随机选择一条语句
pub fn pick_phrase<'a, R: Rng + ?Sized>(corpus: &'a PhraseCorpus, rng: &mut R) -> &'a str {
    let phrases = corpus.as_slice();
    &phrases[rng.gen_range(0..phrases.len())]
}

/// UTF-8 语句的标准 base64 编码（带填充）
pub fn encode_content(phrase: &str) -> String {
    STANDARD.encode(phrase.as_bytes())
}

/// encode_content 的逆操作
pub fn decode_content(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded)
        .context("content is not valid base64")?;
    String::from_utf8(bytes).context("content is not valid UTF-8")
}

/// 按格式生成标识符：前缀 + `length` 个独立均匀抽取自字母表的字符
///
/// 不做唯一性检查
pub fn generate_identifier<R: Rng + ?Sized>(format: &IdentifierFormat, rng: &mut R) -> String {
    let alphabet = format.alphabet();
    let mut identifier = String::with_capacity(format.prefix().len() + format.length() * 4);
    identifier.push_str(format.prefix());
    // IdentifierFormat 保证字母表非空，choose 总是返回 Some
    identifier.extend((0..format.length()).filter_map(|_| alphabet.choose(rng)));
    identifier
}

/// 消息时间窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub timestamp: i64,
    pub expire_time: i64,
}

/// `expire_time = timestamp + ttl_seconds`，`now_seconds` 由调用方提供
pub fn compute_time_window(now_seconds: i64, ttl_seconds: i64) -> TimeWindow {
    TimeWindow {
        timestamp: now_seconds,
        expire_time: now_seconds.saturating_add(ttl_seconds),
    }
}

/// 在 "1" / "2" / "3" 中均匀随机选择
pub fn pick_push_type<R: Rng + ?Sized>(rng: &mut R) -> PushType {
    PushType::ALL[rng.gen_range(0..PushType::ALL.len())]
}

/// 载荷生成配置
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    pub corpus: PhraseCorpus,
    pub to_user_ids: Arc<[String]>,
    pub ttl_seconds: i64,
    pub user_id_format: IdentifierFormat,
    pub content_id_format: IdentifierFormat,
}

impl SynthesizerConfig {
    pub fn new(
        corpus: PhraseCorpus,
        to_user_ids: Vec<String>,
        ttl_seconds: i64,
    ) -> chatify_load_core::Result<Self> {
        ensure_config!(!to_user_ids.is_empty(), "to_user_ids must not be empty");
        ensure_config!(
            to_user_ids.iter().all(|id| !id.trim().is_empty()),
            "to_user_ids must not contain blank ids"
        );
        ensure_config!(
            ttl_seconds > 0,
            "ttl_seconds must be positive, got {}",
            ttl_seconds
        );

        Ok(Self {
            corpus,
            to_user_ids: to_user_ids.into(),
            ttl_seconds,
            user_id_format: IdentifierFormat::user_id(),
            content_id_format: IdentifierFormat::content_id(),
        })
    }
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            corpus: PhraseCorpus::builtin(),
            to_user_ids: vec![DEFAULT_TO_USER_ID.to_string()].into(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            user_id_format: IdentifierFormat::user_id(),
            content_id_format: IdentifierFormat::content_id(),
        }
    }
}

/// 组装一个完整的推送请求
pub fn build_request<R: Rng + ?Sized>(
    config: &SynthesizerConfig,
    clock: &dyn Clock,
    rng: &mut R,
) -> PushRequest {
    let phrase = pick_phrase(&config.corpus, rng);
    let window = compute_time_window(clock.now_seconds(), config.ttl_seconds);

    let content_id = generate_identifier(&config.content_id_format, rng);
    let from_user_id = generate_identifier(&config.user_id_format, rng);

    PushRequest {
        content_id,
        content: encode_content(phrase),
        timestamp: window.timestamp,
        push_type: pick_push_type(rng),
        from_user_id,
        to_user_ids: config.to_user_ids.to_vec(),
        expire_time: window.expire_time.to_string(),
    }
}

/// 绑定了配置与时钟的载荷生成器，可在虚拟用户之间共享
pub struct PayloadSynthesizer {
    config: SynthesizerConfig,
    clock: Arc<dyn Clock>,
}

impl PayloadSynthesizer {
    pub fn new(config: SynthesizerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    pub fn build_request<R: Rng + ?Sized>(&self, rng: &mut R) -> PushRequest {
        build_request(&self.config, self.clock.as_ref(), rng)
    }
}
