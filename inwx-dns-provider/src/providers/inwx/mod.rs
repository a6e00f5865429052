//! INWX DomRobot Provider

mod codec;
mod http;
mod otp;
mod provider;
mod reconciler;
mod session;
mod types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{ProviderError, Result};
use crate::providers::PROVIDER_ID;
use crate::traits::{OtpGenerator, RpcConnector};
use crate::types::InwxConfig;

pub use http::HttpConnector;
pub use otp::TotpGenerator;
pub use provider::ScopedSession;
pub use session::{AuthState, Session};
pub use types::NativeRecord;

/// Production JSON-RPC endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.domrobot.com/jsonrpc/";
/// Sandbox (OTE) JSON-RPC endpoint.
pub const SANDBOX_ENDPOINT: &str = "https://api.ote.domrobot.com/jsonrpc/";
/// INWX rejects TTLs below this; writes raise smaller values to it.
pub const MIN_TTL_SECS: u64 = 300;

/// 默认连接超时（秒）
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 默认请求超时（秒）
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// INWX DNS Provider
///
/// Holds configuration only. Every facade call logs in, works, and logs out;
/// the session lock keeps those lifecycles from overlapping.
pub struct InwxProvider {
    pub(crate) config: InwxConfig,
    pub(crate) connector: Arc<dyn RpcConnector>,
    pub(crate) otp: Arc<dyn OtpGenerator>,
    pub(crate) session_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for InwxProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InwxProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// INWX Provider Builder
pub struct InwxProviderBuilder {
    config: InwxConfig,
    connect_timeout: Duration,
    request_timeout: Duration,
    connector: Option<Arc<dyn RpcConnector>>,
    otp: Option<Arc<dyn OtpGenerator>>,
}

impl InwxProviderBuilder {
    fn new(config: InwxConfig) -> Self {
        Self {
            config,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connector: None,
            otp: None,
        }
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the HTTP transport (used by tests and embedding hosts).
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn RpcConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    #[must_use]
    pub fn otp_generator(mut self, otp: Arc<dyn OtpGenerator>) -> Self {
        self.otp = Some(otp);
        self
    }

    pub fn build(self) -> Result<InwxProvider> {
        self.config
            .validate()
            .map_err(|e| ProviderError::InvalidParameter {
                provider: PROVIDER_ID.to_string(),
                param: e.field().to_string(),
                detail: e.to_string(),
            })?;

        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(HttpConnector::new(
                self.config.endpoint_url.as_deref().unwrap_or(DEFAULT_ENDPOINT),
                self.connect_timeout,
                self.request_timeout,
            )),
        };

        Ok(InwxProvider {
            config: self.config,
            connector,
            otp: self.otp.unwrap_or_else(|| Arc::new(TotpGenerator)),
            session_lock: Arc::new(Mutex::new(())),
        })
    }
}

impl InwxProvider {
    pub fn new(config: InwxConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: InwxConfig) -> InwxProviderBuilder {
        InwxProviderBuilder::new(config)
    }

    pub fn config(&self) -> &InwxConfig {
        &self.config
    }
}
