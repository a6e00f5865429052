//! INWX `RecordProvider` trait 实现

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::OwnedMutexGuard;

use crate::error::{ProviderError, Result};
use crate::providers::PROVIDER_ID;
use crate::traits::RecordProvider;
use crate::types::Record;

use super::reconciler::Reconciler;
use super::session::methods;
use super::{InwxProvider, Session};

/// A logged-in session that holds the provider's session lock.
///
/// Call [`close`](Self::close) to log out. A session dropped while still
/// logged in (a cancelled call, a forgotten `close`) is logged out by a
/// background task on the current tokio runtime, which keeps the lock until
/// the logout has been answered.
pub struct ScopedSession {
    session: Session,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ScopedSession {
    pub async fn close(mut self) {
        self.session.close().await;
    }
}

impl Deref for ScopedSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl fmt::Debug for ScopedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSession")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        let Some(channel) = self.session.abandon() else {
            return;
        };

        let Ok(handle) = Handle::try_current() else {
            log::warn!("[{PROVIDER_ID}] Session dropped outside a runtime, left logged in");
            return;
        };

        log::warn!("[{PROVIDER_ID}] Session dropped without logout, logging out in background");
        let guard = self.guard.take();
        handle.spawn(async move {
            if let Err(e) = channel.call(methods::LOGOUT, json!({})).await {
                log::warn!("[{PROVIDER_ID}] Logout failed: {e}");
            }
            drop(guard);
        });
    }
}

impl InwxProvider {
    /// Logs in and returns the session, waiting for any session already open
    /// on this provider to finish first.
    pub async fn open_session(&self) -> Result<ScopedSession> {
        let guard = Arc::clone(&self.session_lock).lock_owned().await;
        let channel = self.connector.connect()?;
        let session = Session::open(channel, &self.config, self.otp.as_ref()).await?;
        Ok(ScopedSession {
            session,
            guard: Some(guard),
        })
    }
}

/// 按错误是否预期选择日志级别
fn log_failure(operation: &str, zone: &str, error: &ProviderError) {
    if error.is_expected() {
        log::warn!("[{PROVIDER_ID}] {operation} on {zone} failed: {error}");
    } else {
        log::error!("[{PROVIDER_ID}] {operation} on {zone} failed: {error}");
    }
}

#[async_trait]
impl RecordProvider for InwxProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn list_records(&self, zone: &str) -> Result<Vec<Record>> {
        let session = self
            .open_session()
            .await
            .inspect_err(|e| log_failure("list_records", zone, e))?;
        let result = Reconciler::new(&session, zone).list().await;
        session.close().await;
        result.inspect_err(|e| log_failure("list_records", zone, e))
    }

    async fn append_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>> {
        let session = self
            .open_session()
            .await
            .inspect_err(|e| log_failure("append_records", zone, e))?;
        let result = Reconciler::new(&session, zone).append(records).await;
        session.close().await;
        result.inspect_err(|e| log_failure("append_records", zone, e))
    }

    async fn set_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>> {
        let session = self
            .open_session()
            .await
            .inspect_err(|e| log_failure("set_records", zone, e))?;
        let result = Reconciler::new(&session, zone).set(records).await;
        session.close().await;
        result.inspect_err(|e| log_failure("set_records", zone, e))
    }

    async fn delete_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>> {
        let session = self
            .open_session()
            .await
            .inspect_err(|e| log_failure("delete_records", zone, e))?;
        let result = Reconciler::new(&session, zone).delete(records).await;
        session.close().await;
        result.inspect_err(|e| log_failure("delete_records", zone, e))
    }
}
