use serde::{Deserialize, Serialize};
use thiserror::Error;

/// DomRobot status code for a rejected login or unlock.
pub const CODE_AUTHENTICATION_ERROR: i64 = 2200;
/// DomRobot status code for "object exists" (e.g. duplicate record).
pub const CODE_OBJECT_EXISTS: i64 = 2302;
/// DomRobot status code for "object does not exist".
pub const CODE_OBJECT_DOES_NOT_EXIST: i64 = 2303;
/// DomRobot status code for an exceeded session or request limit.
pub const CODE_SESSION_LIMIT_EXCEEDED: i64 = 2502;

/// A non-success envelope returned by the DomRobot API.
///
/// The fields are kept exactly as the remote sent them. The reason code is
/// often the only actionable diagnostic (duplicate record, rate limit,
/// invalid TTL), so it is never rewritten into a local classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Envelope status code (success is `1000..=1500`).
    pub code: i64,
    /// Human-readable status message (`msg`).
    #[serde(rename = "msg")]
    pub message: String,
    /// Machine-readable reason code, if any.
    #[serde(rename = "reasonCode", default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Reason text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RemoteError {
    pub fn is_authentication_failure(&self) -> bool {
        self.code == CODE_AUTHENTICATION_ERROR
    }

    pub fn is_object_exists(&self) -> bool {
        self.code == CODE_OBJECT_EXISTS
    }

    pub fn is_object_missing(&self) -> bool {
        self.code == CODE_OBJECT_DOES_NOT_EXIST
    }

    pub fn is_rate_limited(&self) -> bool {
        self.code == CODE_SESSION_LIMIT_EXCEEDED
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason.as_deref().filter(|r| !r.is_empty()) {
            Some(reason) => write!(
                f,
                "({}) {}. Reason: ({}) {}",
                self.code,
                self.message,
                self.reason_code.as_deref().unwrap_or_default(),
                reason
            ),
            None => write!(f, "({}) {}", self.code, self.message),
        }
    }
}

/// Unified error type for all provider operations.
///
/// Each variant includes a `provider` field identifying the provider that
/// produced it. All variants are serializable for structured error reporting.
///
/// Nothing in this crate retries: transport failures, remote status codes and
/// authentication failures are surfaced to the caller on first occurrence.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    #[error("[{provider}] Network error: {detail}")]
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    #[error("[{provider}] Request timeout: {detail}")]
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// Login or two-factor unlock failed; no session could be established.
    #[error("[{provider}] Authentication failed: {detail}")]
    AuthError {
        /// Provider that produced the error.
        provider: String,
        /// What went wrong (rejected credentials, missing or malformed shared secret, ...).
        detail: String,
        /// The remote envelope, when the API itself rejected the attempt.
        remote: Option<RemoteError>,
    },

    /// The API answered with a non-success status code.
    #[error("[{provider}] {method} failed: {error}")]
    Remote {
        /// Provider that produced the error.
        provider: String,
        /// RPC method that was called.
        method: String,
        /// The remote envelope, verbatim.
        error: RemoteError,
    },

    /// A remote record's content does not match the grammar of its declared type.
    #[error("[{provider}] Cannot parse {record_type} record '{record_name}': {detail}")]
    RecordParseError {
        /// Provider that produced the error.
        provider: String,
        /// Zone-relative name of the offending record.
        record_name: String,
        /// Declared record type.
        record_type: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// More than one remote record shares the `(type, name)` of a record being set.
    #[error(
        "[{provider}] Found {count} {record_type} records named '{record_name}', refusing to pick one"
    )]
    AmbiguousMatch {
        /// Provider that produced the error.
        provider: String,
        /// Zone-relative name of the record being set.
        record_name: String,
        /// Record type of the record being set.
        record_type: String,
        /// Number of candidates found.
        count: usize,
    },

    /// A call was attempted on a session that is not authenticated.
    #[error("[{provider}] Session is not authenticated (state: {state}), cannot call {method}")]
    NotAuthenticated {
        /// Provider that produced the error.
        provider: String,
        /// RPC method that was refused.
        method: String,
        /// Session state at the time of the call.
        state: String,
    },

    /// A request parameter is invalid (e.g. empty record id, malformed endpoint URL).
    #[error("[{provider}] Invalid parameter '{param}': {detail}")]
    InvalidParameter {
        /// Provider that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// Failed to parse the API's response payload.
    #[error("[{provider}] Parse error: {detail}")]
    ParseError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    #[error("[{provider}] Serialization error: {detail}")]
    SerializationError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the serialization failure.
        detail: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::AuthError { .. }
                | Self::Remote { .. }
                | Self::RecordParseError { .. }
                | Self::AmbiguousMatch { .. }
                | Self::InvalidParameter { .. }
        )
    }

    /// The remote envelope carried by this error, if the API produced it.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote { error, .. } => Some(error),
            Self::AuthError { remote, .. } => remote.as_ref(),
            _ => None,
        }
    }
}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
