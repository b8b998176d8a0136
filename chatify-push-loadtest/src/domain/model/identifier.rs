//! 标识符格式：固定前缀 + 定长随机后缀

use chatify_load_core::{LoadGenError, Result};

/// 用户 ID 字母表（大小写字母 + 数字）
pub const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 内容 ID 字母表
pub const DIGITS: &str = "0123456789";

/// 标识符格式
///
/// 生成的标识符长度为 `prefix.len() + length`，后缀字符全部来自 `alphabet`。
/// 不保证唯一性。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierFormat {
    prefix: String,
    alphabet: Vec<char>,
    length: usize,
}

impl IdentifierFormat {
    pub fn new(prefix: impl Into<String>, alphabet: &str, length: usize) -> Result<Self> {
        let prefix = prefix.into();
        if alphabet.is_empty() {
            return Err(LoadGenError::Generation(format!(
                "identifier alphabet for prefix '{}' must not be empty",
                prefix
            )));
        }

        Ok(Self {
            prefix,
            alphabet: alphabet.chars().collect(),
            length,
        })
    }

    /// 发送方用户 ID：uid + 10 位字母数字
    pub fn user_id() -> Self {
        Self {
            prefix: "uid".to_string(),
            alphabet: ALPHANUMERIC.chars().collect(),
            length: 10,
        }
    }

    /// 内容 ID：content + 3 位数字
    pub fn content_id() -> Self {
        Self {
            prefix: "content".to_string(),
            alphabet: DIGITS.chars().collect(),
            length: 3,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// 检查候选字符串是否符合该格式
    pub fn matches(&self, candidate: &str) -> bool {
        let Some(suffix) = candidate.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        suffix.chars().count() == self.length && suffix.chars().all(|c| self.alphabet.contains(&c))
    }
}
