// crates/authz-gate-server/src/auth.rs
// ============================================================================
// Module: Caller Authentication
// Description: Authentication of calling services for the decision endpoint.
// Purpose: Provide strict, fail-closed caller checks before any decision.
// Dependencies: authz-gate-config, sha2, subtle
// ============================================================================

//! ## Overview
//! The decision endpoint serves internal callers only. Two modes exist:
//! `local_only` admits loopback peers, and `internal_secret` requires the
//! `X-Internal-Secret` header to match one configured secret. Secrets are
//! compared in constant time and only their sha256 fingerprint is audited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::net::IpAddr;

use authz_gate_config::ServerAuthConfig;
use authz_gate_config::ServerAuthMode;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the shared internal secret.
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";
/// Maximum accepted secret header length in bytes.
const MAX_SECRET_HEADER_BYTES: usize = 1024;
/// Number of fingerprint hex characters recorded in audit events.
const FINGERPRINT_HEX_CHARS: usize = 16;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Authentication method used for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerAuthMethod {
    /// Loopback peer.
    Local,
    /// Shared internal secret.
    InternalSecret,
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Authentication method.
    pub method: CallerAuthMethod,
    /// Truncated sha256 fingerprint of the presented secret.
    pub secret_fingerprint: Option<String>,
}

/// Caller authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Missing or invalid credentials.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Authenticator
// ============================================================================

/// Caller authenticator derived from server config.
pub struct CallerAuthenticator {
    /// Configured auth mode.
    mode: ServerAuthMode,
    /// Accepted internal secrets as raw bytes.
    secrets: Vec<Vec<u8>>,
}

impl CallerAuthenticator {
    /// Builds an authenticator from server auth configuration.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        Self {
            mode: config.mode,
            secrets: config
                .internal_secrets
                .iter()
                .map(|secret| secret.as_bytes().to_vec())
                .collect(),
        }
    }

    /// Returns the configured auth mode.
    #[must_use]
    pub const fn mode(&self) -> ServerAuthMode {
        self.mode
    }

    /// Authenticates a caller from its peer address and secret header.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the caller is not admitted.
    pub fn authenticate(
        &self,
        peer_ip: Option<IpAddr>,
        secret_header: Option<&str>,
    ) -> Result<CallerIdentity, AuthError> {
        match self.mode {
            ServerAuthMode::LocalOnly => {
                if peer_ip.is_some_and(|ip| ip.is_loopback()) {
                    Ok(CallerIdentity {
                        method: CallerAuthMethod::Local,
                        secret_fingerprint: None,
                    })
                } else {
                    Err(AuthError::Unauthenticated(
                        "local-only mode requires loopback access".to_string(),
                    ))
                }
            }
            ServerAuthMode::InternalSecret => self.authenticate_secret(secret_header),
        }
    }

    /// Checks the presented secret against every configured secret.
    fn authenticate_secret(&self, header: Option<&str>) -> Result<CallerIdentity, AuthError> {
        let presented = header
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AuthError::Unauthenticated("missing internal secret".to_string()))?;
        if presented.len() > MAX_SECRET_HEADER_BYTES {
            return Err(AuthError::Unauthenticated("internal secret header too large".to_string()));
        }
        // Every configured secret is compared so the match position is not observable.
        let matched = self.secrets.iter().fold(subtle::Choice::from(0), |acc, secret| {
            acc | secret.as_slice().ct_eq(presented.as_bytes())
        });
        if !bool::from(matched) {
            return Err(AuthError::Unauthenticated("invalid internal secret".to_string()));
        }
        Ok(CallerIdentity {
            method: CallerAuthMethod::InternalSecret,
            secret_fingerprint: Some(fingerprint(presented)),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a truncated hex sha256 fingerprint of a secret.
fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    let mut hex = String::with_capacity(FINGERPRINT_HEX_CHARS);
    for byte in digest.iter().take(FINGERPRINT_HEX_CHARS / 2) {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use std::net::Ipv4Addr;

    use super::*;

    const SECRET: &str = "s3cr3t-internal-token";

    fn secret_authenticator() -> CallerAuthenticator {
        CallerAuthenticator::from_config(&ServerAuthConfig {
            mode: ServerAuthMode::InternalSecret,
            internal_secrets: vec!["rotated-out-token-0".to_string(), SECRET.to_string()],
        })
    }

    #[test]
    fn local_only_admits_loopback() {
        let auth = CallerAuthenticator::from_config(&ServerAuthConfig::default());
        let identity = auth.authenticate(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), None).unwrap();
        assert_eq!(identity.method, CallerAuthMethod::Local);
        assert!(identity.secret_fingerprint.is_none());
    }

    #[test]
    fn local_only_rejects_remote_and_unknown_peers() {
        let auth = CallerAuthenticator::from_config(&ServerAuthConfig::default());
        let remote = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        assert!(auth.authenticate(Some(remote), Some(SECRET)).is_err());
        assert!(auth.authenticate(None, None).is_err());
    }

    #[test]
    fn secret_mode_accepts_any_configured_secret() {
        let auth = secret_authenticator();
        let remote = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)));
        let identity = auth.authenticate(remote, Some(SECRET)).unwrap();
        assert_eq!(identity.method, CallerAuthMethod::InternalSecret);
        assert_eq!(
            identity.secret_fingerprint.as_deref().map(str::len),
            Some(FINGERPRINT_HEX_CHARS)
        );
        assert!(auth.authenticate(remote, Some("rotated-out-token-0")).is_ok());
    }

    #[test]
    fn secret_mode_rejects_wrong_missing_and_prefix_secrets() {
        let auth = secret_authenticator();
        let loopback = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(auth.authenticate(loopback, None).is_err());
        assert!(auth.authenticate(loopback, Some("")).is_err());
        assert!(auth.authenticate(loopback, Some("s3cr3t")).is_err());
        assert!(auth.authenticate(loopback, Some("s3cr3t-internal-token-extra")).is_err());
    }

    #[test]
    fn padded_secret_is_rejected() {
        let auth = secret_authenticator();
        let loopback = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(auth.authenticate(loopback, Some(" s3cr3t-internal-token ")).is_err());
        assert!(auth.authenticate(loopback, Some("s3cr3t-internal-token\t")).is_err());
        assert!(auth.authenticate(loopback, Some(SECRET)).is_ok());
    }

    #[test]
    fn fingerprint_is_stable_and_not_the_secret() {
        assert_eq!(fingerprint(SECRET), fingerprint(SECRET));
        assert_ne!(fingerprint(SECRET), fingerprint("other-secret-value"));
        assert!(!fingerprint(SECRET).contains(SECRET));
    }
}
