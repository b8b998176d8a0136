//! 系统推送请求载荷

use serde::{Deserialize, Serialize};

/// 推送类型，线上协议中为字符串 "1" / "2" / "3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PushType {
    #[serde(rename = "1")]
    Type1,
    #[serde(rename = "2")]
    Type2,
    #[serde(rename = "3")]
    Type3,
}

impl PushType {
    pub const ALL: [PushType; 3] = [PushType::Type1, PushType::Type2, PushType::Type3];

    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Type1 => "1",
            PushType::Type2 => "2",
            PushType::Type3 => "3",
        }
    }
}

impl std::fmt::Display for PushType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// sendSystemPush 请求体
///
/// 每次迭代新建一个，序列化发送后即丢弃
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRequest {
    /// content + 3 位数字
    pub content_id: String,
    /// UTF-8 语句的 base64 编码
    pub content: String,
    /// 生成时间（秒）
    pub timestamp: i64,
    pub push_type: PushType,
    /// uid + 10 位字母数字
    pub from_user_id: String,
    pub to_user_ids: Vec<String>,
    /// timestamp + TTL，按服务端协议以字符串传输
    pub expire_time: String,
}

impl PushRequest {
    /// 解析 expire_time 为秒级时间戳
    pub fn expire_time_seconds(&self) -> Option<i64> {
        self.expire_time.parse().ok()
    }

    /// 序列化为 JSON 请求体
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
