//! TTL 序列化/反序列化工具
//!
//! - 序列化: `Duration` -> 整数秒
//! - 反序列化: 整数秒 或 数字字符串（如 `"3600"`）-> `Duration`
//!
//! 不足一秒的部分直接截断。

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// 序列化 `Duration` 为整数秒
pub fn serialize<S>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(ttl.as_secs())
}

/// 反序列化：支持整数秒或数字字符串
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        U64(u64),
        String(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::U64(secs) => Ok(Duration::from_secs(secs)),
        Seconds::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| Error::custom(format!("Invalid TTL '{s}': {e}"))),
    }
}
