//! Authenticated DomRobot session
//!
//! A [`Session`] wraps one [`RpcChannel`] and walks it through
//! `Unauthenticated -> ChallengeIssued -> Authenticated -> Closed`.
//! Only an `Authenticated` session sends record calls; anything else is
//! refused locally.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Value, json};

use crate::error::{ProviderError, Result};
use crate::providers::PROVIDER_ID;
use crate::traits::{OtpGenerator, RpcChannel};
use crate::types::InwxConfig;

use super::MIN_TTL_SECS;
use super::types::{
    CreateRecordRequest, CreateRecordResponse, CreateZoneRequest, DeleteRecordRequest,
    DeleteZoneRequest, InfoRequest, InfoResponse, LoginRequest, LoginResponse, NativeRecord,
    UnlockRequest, UpdateRecordRequest,
};

pub(crate) mod methods {
    pub const LOGIN: &str = "account.login";
    pub const UNLOCK: &str = "account.unlock";
    pub const LOGOUT: &str = "account.logout";
    pub const INFO: &str = "nameserver.info";
    pub const CREATE_RECORD: &str = "nameserver.createRecord";
    pub const UPDATE_RECORD: &str = "nameserver.updateRecord";
    pub const DELETE_RECORD: &str = "nameserver.deleteRecord";
    pub const CREATE_ZONE: &str = "nameserver.create";
    pub const DELETE_ZONE: &str = "nameserver.delete";
}

/// The only second-factor method the API issues.
const GOOGLE_AUTH: &str = "GOOGLE-AUTH";

/// 会话认证状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// Password accepted, second factor outstanding.
    ChallengeIssued { method: String },
    Authenticated,
    Closed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::ChallengeIssued { method } => write!(f, "challenge issued ({method})"),
            Self::Authenticated => f.write_str("authenticated"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// INWX 会话
pub struct Session {
    channel: Arc<dyn RpcChannel>,
    state: AuthState,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Logs in on a fresh channel, answering a two-factor challenge if the
    /// account has one.
    ///
    /// A rejected login or unlock, a missing shared secret and a malformed
    /// shared secret all fail with [`ProviderError::AuthError`]. When the
    /// password was accepted but the unlock could not complete, the
    /// half-open session is logged out before returning.
    pub async fn open(
        channel: Box<dyn RpcChannel>,
        config: &InwxConfig,
        otp: &dyn OtpGenerator,
    ) -> Result<Self> {
        let mut session = Self {
            channel: Arc::from(channel),
            state: AuthState::Unauthenticated,
        };

        if let Err(e) = session.authenticate(config, otp).await {
            if session.state != AuthState::Unauthenticated {
                session.close().await;
            }
            return Err(e);
        }

        log::debug!("[{PROVIDER_ID}] Logged in as {}", config.username);
        Ok(session)
    }

    async fn authenticate(&mut self, config: &InwxConfig, otp: &dyn OtpGenerator) -> Result<()> {
        // resData may be null when the account has no second factor
        let login: Option<LoginResponse> = self
            .send(
                methods::LOGIN,
                &LoginRequest {
                    user: &config.username,
                    pass: &config.password,
                },
            )
            .await
            .map_err(|e| rejected(methods::LOGIN, e))?;

        let Some(method) = login.as_ref().and_then(LoginResponse::challenge) else {
            self.state = AuthState::Authenticated;
            return Ok(());
        };
        self.state = AuthState::ChallengeIssued {
            method: method.clone(),
        };

        if method != GOOGLE_AUTH {
            return Err(auth_error(format!(
                "unsupported two-factor method '{method}'"
            )));
        }

        let secret = config
            .shared_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                auth_error("account requires two-factor authentication but no shared secret is configured")
            })?;
        let tan = otp.generate(secret)?;

        let _: IgnoredAny = self
            .send(methods::UNLOCK, &UnlockRequest { tan: &tan })
            .await
            .map_err(|e| rejected(methods::UNLOCK, e))?;

        self.state = AuthState::Authenticated;
        Ok(())
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Raw call; refused without a round trip unless authenticated.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.ensure_authenticated(method)?;
        self.channel.call(method, params).await
    }

    /// Best-effort `account.logout`. Failures are logged and swallowed.
    pub async fn close(&mut self) {
        if matches!(self.state, AuthState::Closed) {
            return;
        }

        if self.state != AuthState::Unauthenticated {
            if let Err(e) = self.channel.call(methods::LOGOUT, json!({})).await {
                log::warn!("[{PROVIDER_ID}] Logout failed: {e}");
            }
        }
        self.state = AuthState::Closed;
    }

    /// Marks the session closed without a round trip and hands back the
    /// channel when the server still holds a login on it.
    pub(crate) fn abandon(&mut self) -> Option<Arc<dyn RpcChannel>> {
        let logged_in = !matches!(self.state, AuthState::Unauthenticated | AuthState::Closed);
        self.state = AuthState::Closed;
        logged_in.then(|| Arc::clone(&self.channel))
    }

    // ============ nameserver.* ============

    /// All records of a zone (`domain` without trailing dot).
    pub async fn list_zone(&self, domain: &str) -> Result<Vec<NativeRecord>> {
        self.info(&InfoRequest {
            domain,
            record_type: None,
            name: None,
            content: None,
        })
        .await
    }

    /// `nameserver.info` filtered by type and absolute name, and by content
    /// when given. The remote filter may match loosely; callers re-check.
    pub async fn find_records(
        &self,
        domain: &str,
        record_type: &str,
        name: &str,
        content: Option<&str>,
    ) -> Result<Vec<NativeRecord>> {
        self.info(&InfoRequest {
            domain,
            record_type: Some(record_type),
            name: Some(name),
            content,
        })
        .await
    }

    async fn info(&self, request: &InfoRequest<'_>) -> Result<Vec<NativeRecord>> {
        let response: InfoResponse = self.request(methods::INFO, request).await?;
        Ok(response.record)
    }

    /// Creates a record and returns its remote id. TTL is floored.
    pub async fn create_record(&self, domain: &str, record: &NativeRecord) -> Result<String> {
        let response: CreateRecordResponse = self
            .request(
                methods::CREATE_RECORD,
                &CreateRecordRequest {
                    domain,
                    name: &record.name,
                    record_type: &record.record_type,
                    content: &record.content,
                    ttl: ensure_min_ttl(record.ttl),
                    prio: record.prio,
                },
            )
            .await?;
        Ok(response.id)
    }

    /// Rewrites a record in place by id. TTL is floored.
    pub async fn update_record(&self, record: &NativeRecord) -> Result<()> {
        if record.id.is_empty() {
            return Err(ProviderError::InvalidParameter {
                provider: PROVIDER_ID.to_string(),
                param: "id".to_string(),
                detail: format!(
                    "{} record '{}' cannot be updated without an id",
                    record.record_type, record.name
                ),
            });
        }

        let _: IgnoredAny = self
            .request(
                methods::UPDATE_RECORD,
                &UpdateRecordRequest {
                    id: &record.id,
                    name: &record.name,
                    record_type: &record.record_type,
                    content: &record.content,
                    ttl: ensure_min_ttl(record.ttl),
                    prio: record.prio,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn delete_record(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(ProviderError::InvalidParameter {
                provider: PROVIDER_ID.to_string(),
                param: "id".to_string(),
                detail: "cannot delete a record without an id".to_string(),
            });
        }

        let _: IgnoredAny = self
            .request(methods::DELETE_RECORD, &DeleteRecordRequest { id })
            .await?;
        Ok(())
    }

    /// Creates a zone (`zone_type` is `"MASTER"` or `"SLAVE"`).
    pub async fn create_zone(
        &self,
        domain: &str,
        zone_type: &str,
        nameservers: &[String],
    ) -> Result<()> {
        let _: IgnoredAny = self
            .request(
                methods::CREATE_ZONE,
                &CreateZoneRequest {
                    domain,
                    zone_type,
                    ns: nameservers,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn delete_zone(&self, domain: &str) -> Result<()> {
        let _: IgnoredAny = self
            .request(methods::DELETE_ZONE, &DeleteZoneRequest { domain })
            .await?;
        Ok(())
    }

    // ============ plumbing ============

    fn ensure_authenticated(&self, method: &str) -> Result<()> {
        if self.state == AuthState::Authenticated {
            Ok(())
        } else {
            Err(ProviderError::NotAuthenticated {
                provider: PROVIDER_ID.to_string(),
                method: method.to_string(),
                state: self.state.to_string(),
            })
        }
    }

    /// Authenticated typed call.
    async fn request<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.ensure_authenticated(method)?;
        self.send(method, params).await
    }

    /// Typed call without the state check (login and unlock go through here).
    async fn send<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params).map_err(|e| ProviderError::SerializationError {
            provider: PROVIDER_ID.to_string(),
            detail: e.to_string(),
        })?;

        let res_data = self.channel.call(method, params).await?;

        serde_json::from_value(res_data).map_err(|e| ProviderError::ParseError {
            provider: PROVIDER_ID.to_string(),
            detail: format!("unexpected {method} response: {e}"),
        })
    }
}

fn ensure_min_ttl(ttl: u64) -> u64 {
    ttl.max(MIN_TTL_SECS)
}

fn auth_error(detail: impl Into<String>) -> ProviderError {
    ProviderError::AuthError {
        provider: PROVIDER_ID.to_string(),
        detail: detail.into(),
        remote: None,
    }
}

/// Remote rejections of login/unlock become `AuthError`; transport errors pass through.
fn rejected(method: &str, error: ProviderError) -> ProviderError {
    match error {
        ProviderError::Remote { error, .. } => ProviderError::AuthError {
            provider: PROVIDER_ID.to_string(),
            detail: format!("{method} rejected: {error}"),
            remote: Some(error),
        },
        other => other,
    }
}
