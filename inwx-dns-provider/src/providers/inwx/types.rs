//! DomRobot 请求/响应类型

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderError, RemoteError, Result};
use crate::providers::PROVIDER_ID;

// ============ Record ============

/// A record as the DomRobot API stores it.
///
/// `name` is zone-absolute when read back and zone-relative when written
/// (empty for the apex). MX, SRV and service-binding records keep their
/// priority in `prio`, not in `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeRecord {
    /// Remote id; empty until created.
    #[serde(default, with = "record_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub content: String,
    /// TTL in seconds.
    #[serde(default)]
    pub ttl: u64,
    #[serde(default)]
    pub prio: u16,
}

/// Record ids are strings locally but the API sends and expects integers.
///
/// Deserialization accepts either; serialization emits an integer whenever
/// the id is numeric.
mod record_id {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(id),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            I64(i64),
            U64(u64),
            String(String),
        }

        Ok(match Option::<RawId>::deserialize(deserializer)? {
            Some(RawId::I64(n)) => n.to_string(),
            Some(RawId::U64(n)) => n.to_string(),
            Some(RawId::String(s)) => s,
            None => String::new(),
        })
    }
}

// ============ Requests ============

#[derive(Debug, Serialize)]
pub(crate) struct InfoRequest<'a> {
    pub domain: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRecordRequest<'a> {
    pub domain: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub content: &'a str,
    pub ttl: u64,
    pub prio: u16,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRecordRequest<'a> {
    #[serde(with = "record_id")]
    pub id: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub content: &'a str,
    pub ttl: u64,
    pub prio: u16,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteRecordRequest<'a> {
    #[serde(with = "record_id")]
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateZoneRequest<'a> {
    pub domain: &'a str,
    #[serde(rename = "type")]
    pub zone_type: &'a str,
    pub ns: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteZoneRequest<'a> {
    pub domain: &'a str,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub user: &'a str,
    pub pass: &'a str,
}

#[derive(Serialize)]
pub(crate) struct UnlockRequest<'a> {
    pub tan: &'a str,
}

// ============ Responses ============

#[derive(Debug, Deserialize)]
pub(crate) struct InfoResponse {
    /// Absent when the zone (or the filter) has no records.
    #[serde(default)]
    pub record: Vec<NativeRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRecordResponse {
    #[serde(with = "record_id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub tfa: Option<Value>,
}

impl LoginResponse {
    /// The second-factor method the account demands, if any.
    ///
    /// Accounts without two-factor report `"0"` (or nothing at all).
    pub fn challenge(&self) -> Option<String> {
        match &self.tfa {
            Some(Value::String(s)) if !s.is_empty() && s != "0" => Some(s.clone()),
            _ => None,
        }
    }
}

/// The envelope every DomRobot response is wrapped in.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseEnvelope {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(rename = "reasonCode", default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(rename = "resData", default)]
    pub res_data: Value,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        (1000..=1500).contains(&self.code)
    }

    /// `resData` on success, the verbatim remote error otherwise.
    pub fn into_result(self, method: &str) -> Result<Value> {
        if self.is_success() {
            return Ok(self.res_data);
        }

        Err(ProviderError::Remote {
            provider: PROVIDER_ID.to_string(),
            method: method.to_string(),
            error: RemoteError {
                code: self.code,
                message: self.msg,
                reason_code: self.reason_code,
                reason: self.reason,
            },
        })
    }
}
