//! # inwx-dns-provider
//!
//! DNS record management for the [INWX](https://www.inwx.com/) DomRobot
//! JSON-RPC API, behind the four-operation contract DNS automation hosts
//! (ACME DNS-01 solvers and the like) drive: list, append, set, delete.
//!
//! ## Feature Flags
//!
//! ### TLS Backend
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls. Recommended for cross-compilation and static builds.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! inwx-dns-provider = "0.1"
//! ```
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use inwx_dns_provider::{InwxConfig, InwxProvider, Record, RecordProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = InwxConfig::from_env()?;
//!     let provider = InwxProvider::new(config)?;
//!
//!     // Publish an ACME challenge, replacing any previous one
//!     let challenge = Record::txt("_acme-challenge", "token-value", Duration::from_secs(300));
//!     let applied = provider.set_records("example.com.", &[challenge]).await?;
//!     println!("record id: {:?}", applied[0].id);
//!
//!     for record in provider.list_records("example.com.").await? {
//!         let rr = record.rr();
//!         println!("{} {} {} {}", rr.name, rr.ttl.as_secs(), rr.record_type, rr.data);
//!     }
//!
//!     provider.delete_records("example.com.", &applied).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! Every call logs in (answering the "Mobile TAN" two-factor challenge from
//! [`InwxConfig::shared_secret`] when the account requires it), does its work
//! and logs out. Calls on one [`InwxProvider`] never overlap; a second call
//! waits for the first session to close. Hosts that want several raw calls
//! under one login use [`InwxProvider::open_session`].
//!
//! A call whose future is dropped mid-flight (a host deadline, `select!`)
//! still logs out: the session is handed to a background task on the current
//! tokio runtime, and the next call waits for that logout.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError):
//!
//! - [`ProviderError::AuthError`]: login or unlock rejected, shared secret missing or malformed
//! - [`ProviderError::Remote`]: the API answered with a non-success code; the
//!   [`RemoteError`] carries `code`, `msg`, `reasonCode` and `reason` verbatim
//! - [`ProviderError::RecordParseError`]: a remote record does not fit its type's grammar
//! - [`ProviderError::AmbiguousMatch`]: `set_records` found several records at one `(type, name)`
//!
//! Nothing is retried. A failure in the middle of a batch leaves the earlier
//! records of that batch applied.

mod error;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

#[cfg(test)]
mod test_utils;

// Re-export error types
pub use error::{
    CODE_AUTHENTICATION_ERROR, CODE_OBJECT_DOES_NOT_EXIST, CODE_OBJECT_EXISTS,
    CODE_SESSION_LIMIT_EXCEEDED, ProviderError, RemoteError, Result,
};

// Re-export traits
pub use traits::{OtpGenerator, RecordProvider, RpcChannel, RpcConnector};

// Re-export types
pub use types::{CredentialValidationError, InwxConfig, Record, RecordData, Rr, SvcParams};

// Re-export the provider
pub use providers::common::{full_name_to_relative, normalize_domain_name, relative_to_full_name};
pub use providers::{
    AuthState, DEFAULT_ENDPOINT, HttpConnector, InwxProvider, InwxProviderBuilder, MIN_TTL_SECS,
    NativeRecord, SANDBOX_ENDPOINT, ScopedSession, Session, TotpGenerator,
};

// Re-export utils module
pub use utils::ttl;
