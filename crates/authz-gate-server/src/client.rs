// crates/authz-gate-server/src/client.rs
// ============================================================================
// Module: Decision Client
// Description: HTTP client for calling services.
// Purpose: Ask the decision endpoint for verdicts and fail closed on errors.
// Dependencies: authz-gate-core, reqwest
// ============================================================================

//! ## Overview
//! [`DecisionClient::decide`] never returns an error: any transport failure,
//! non-200 status, or undecodable body becomes a deny with reason
//! `resolver-unavailable`. Use [`DecisionClient::try_decide`] when the caller
//! needs to distinguish those failures, for example to log them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use authz_gate_core::DecisionReason;
use authz_gate_core::Verdict;
use thiserror::Error;

use crate::auth::INTERNAL_SECRET_HEADER;
use crate::protocol::AuthorizeRequest;
use crate::server::AUTHORIZE_PATH;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default request timeout for decision calls.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Client
// ============================================================================

/// Fail-closed client for the decision endpoint.
#[derive(Debug, Clone)]
pub struct DecisionClient {
    /// Underlying HTTP client.
    http: reqwest::Client,
    /// Full decision endpoint URL.
    endpoint: String,
    /// Internal secret sent with each request.
    internal_secret: Option<String>,
}

impl DecisionClient {
    /// Builds a client for a server base URL such as `http://127.0.0.1:10001`.
    ///
    /// Only plain `http://` is accepted; the client is built without TLS.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the URL or HTTP client is invalid.
    pub fn new(
        base_url: &str,
        internal_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.starts_with("https://") {
            return Err(ClientError::Config("https base urls are not supported".to_string()));
        }
        if !base.starts_with("http://") {
            return Err(ClientError::Config("base url must be http".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{base}{AUTHORIZE_PATH}"),
            internal_secret,
        })
    }

    /// Returns the decision endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Requests a verdict, denying on any failure.
    pub async fn decide(&self, request: &AuthorizeRequest) -> Verdict {
        self.try_decide(request)
            .await
            .unwrap_or_else(|_| Verdict::deny(DecisionReason::ResolverUnavailable))
    }

    /// Requests a verdict, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport, status, or decode failures.
    pub async fn try_decide(&self, request: &AuthorizeRequest) -> Result<Verdict, ClientError> {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(secret) = &self.internal_secret {
            builder = builder.header(INTERNAL_SECRET_HEADER, secret);
        }
        let response = builder.send().await.map_err(|err| ClientError::Transport(err.to_string()))?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ClientError::Status(status.as_u16()));
        }
        response.json::<Verdict>().await.map_err(|err| ClientError::Decode(err.to_string()))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Decision client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("client config error: {0}")]
    Config(String),
    /// Request could not be sent or timed out.
    #[error("transport error: {0}")]
    Transport(String),
    /// Endpoint answered with a non-200 status.
    #[error("unexpected status: {0}")]
    Status(u16),
    /// Response body was not a verdict.
    #[error("decode error: {0}")]
    Decode(String),
}
