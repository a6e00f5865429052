use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::Record;

/// One authenticated-or-not conversation with the DomRobot API.
///
/// A channel owns its transport state (the session cookie), so every
/// [`RpcConnector::connect`] yields a fresh, logged-out conversation.
#[async_trait]
pub trait RpcChannel: Send + Sync {
    /// 发送一次 RPC 调用，返回 `resData`（成功码 1000–1500）。
    ///
    /// Non-success envelopes surface as [`ProviderError::Remote`](crate::ProviderError::Remote)
    /// with the remote fields untouched.
    async fn call(&self, method: &str, params: Value) -> Result<Value>;
}

/// Factory for fresh [`RpcChannel`]s, one per session.
pub trait RpcConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn RpcChannel>>;
}

/// One-time password source for the two-factor unlock.
pub trait OtpGenerator: Send + Sync {
    /// Returns the current code for a base32 shared secret.
    fn generate(&self, shared_secret: &str) -> Result<String>;
}

/// DNS 记录管理 Trait
///
/// The four-operation contract a DNS automation host (e.g. an ACME DNS-01
/// solver) drives. Zones are passed fully qualified (`"example.com."`);
/// record names are relative to the zone (`"@"` for the apex).
#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    /// 获取区域内全部记录
    async fn list_records(&self, zone: &str) -> Result<Vec<Record>>;

    /// Creates every record, in order, without looking for existing ones.
    /// Returns the inputs with their remote ids filled in.
    async fn append_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>>;

    /// Creates or updates so that each `(type, name)` holds the given record.
    async fn set_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>>;

    /// Deletes the records matching `(type, name, content)`. Returns what was
    /// actually removed.
    async fn delete_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>>;
}
