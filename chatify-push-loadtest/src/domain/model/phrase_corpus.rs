//! 语料库 - 压测消息内容的唯一来源

use std::sync::Arc;

use chatify_load_core::{LoadGenError, Result};

/// 内置中文聊天语句
pub const DEFAULT_PHRASES: [&str; 15] = [
    "你好啊，今天过得怎么样？",
    "最近在看什么好看的电视剧吗？",
    "今天天气真不错，适合出去走走。",
    "吃饭了吗？",
    "工作好忙啊，感觉快累垮了。",
    "周末有什么计划吗？",
    "哈哈，这个笑话太搞笑了！",
    "我刚学会做一道新菜，味道还不错。",
    "你去过上海吗？那边的外滩很漂亮。",
    "最近压力有点大，想找人聊聊天。",
    "听说新上映的电影很不错，要不要一起去看？",
    "今天学到了一个新知识，感觉很有意思。",
    "你的新发型真好看！",
    "明天一起去爬山吧？",
    "这个项目什么时候能完成？",
];

/// 只读语料库
///
/// 创建后不可变，克隆只增加引用计数，可在所有虚拟用户之间共享。
/// 保证非空且每条语句非空。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseCorpus {
    phrases: Arc<[String]>,
}

impl PhraseCorpus {
    /// 从给定语句创建语料库
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
        if phrases.is_empty() {
            return Err(LoadGenError::Generation(
                "phrase corpus must not be empty".to_string(),
            ));
        }
        if let Some(index) = phrases.iter().position(|p| p.is_empty()) {
            return Err(LoadGenError::Generation(format!(
                "phrase corpus entry #{} is empty",
                index
            )));
        }

        Ok(Self {
            phrases: phrases.into(),
        })
    }

    /// 内置语料库
    pub fn builtin() -> Self {
        Self {
            phrases: DEFAULT_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// 恒为 false
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.phrases.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.phrases
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }
}

impl Default for PhraseCorpus {
    fn default() -> Self {
        Self::builtin()
    }
}
