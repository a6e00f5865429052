//! TOTP codes for the "Mobile TAN" unlock

use chrono::Utc;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{ProviderError, Result};
use crate::providers::PROVIDER_ID;
use crate::traits::OtpGenerator;

const DIGITS: usize = 6;
const STEP_SECS: u64 = 30;

/// RFC 6238 generator (SHA-1, 6 digits, 30 s step), as used by authenticator apps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotpGenerator;

impl TotpGenerator {
    /// Code for the given Unix time.
    pub fn generate_at(&self, shared_secret: &str, unix_secs: u64) -> Result<String> {
        Ok(build_totp(shared_secret)?.generate(unix_secs))
    }
}

impl OtpGenerator for TotpGenerator {
    fn generate(&self, shared_secret: &str) -> Result<String> {
        let now = u64::try_from(Utc::now().timestamp())
            .map_err(|_| otp_error("system clock is before 1970"))?;
        self.generate_at(shared_secret, now)
    }
}

fn build_totp(shared_secret: &str) -> Result<TOTP> {
    // Authenticator apps display the secret in spaced groups, sometimes lowercase.
    let normalized: String = shared_secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.is_empty() {
        return Err(otp_error("shared secret is empty"));
    }

    let bytes = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|e| otp_error(format!("shared secret is not valid base32: {e:?}")))?;

    // new_unchecked: INWX secrets may be shorter than the 128 bits TOTP::new insists on.
    Ok(TOTP::new_unchecked(Algorithm::SHA1, DIGITS, 1, STEP_SECS, bytes))
}

fn otp_error(detail: impl Into<String>) -> ProviderError {
    ProviderError::AuthError {
        provider: PROVIDER_ID.to_string(),
        detail: detail.into(),
        remote: None,
    }
}
