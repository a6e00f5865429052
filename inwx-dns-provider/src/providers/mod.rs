//! DNS Provider implementations

/// Shared utilities used by provider implementations.
pub mod common;

mod inwx;

pub use inwx::{
    DEFAULT_ENDPOINT, HttpConnector, InwxProvider, InwxProviderBuilder, MIN_TTL_SECS,
    SANDBOX_ENDPOINT, ScopedSession,
};
pub use inwx::{AuthState, NativeRecord, Session, TotpGenerator};

/// Identifier carried in every error produced by this crate.
pub(crate) const PROVIDER_ID: &str = "inwx";
