// crates/authz-gate-server/src/protocol.rs
// ============================================================================
// Module: Decision Wire Protocol
// Description: JSON request and error payloads for the decision endpoint.
// Purpose: Validate untrusted request bodies into engine decision requests.
// Dependencies: authz-gate-core, serde, uuid
// ============================================================================

//! ## Overview
//! The endpoint accepts camelCase JSON and answers with the engine's
//! [`authz_gate_core::Verdict`] unchanged. Malformed requests never reach the
//! engine: they are rejected here and mapped to a 400 response.
//! Security posture: request bodies are untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use authz_gate_core::DecisionRequest;
use authz_gate_core::Permission;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of `userId` in bytes.
pub const MAX_USER_ID_LENGTH: usize = 256;
/// Maximum length of `userRole` in bytes.
pub const MAX_USER_ROLE_LENGTH: usize = 64;

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Decision request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    /// Authenticated principal identifier.
    pub user_id: String,
    /// Organization UUID for `org:` permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Workspace UUID for `workspace:` permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// Requested permission string.
    pub permission: String,
    /// Global role claim asserted by the calling service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

impl AuthorizeRequest {
    /// Creates a request body with no scopes and no role claim.
    #[must_use]
    pub fn new(user_id: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            organization_id: None,
            workspace_id: None,
            permission: permission.into(),
            user_role: None,
        }
    }

    /// Sets the organization scope.
    #[must_use]
    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Sets the workspace scope.
    #[must_use]
    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Sets the global role claim.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = Some(role.into());
        self
    }

    /// Validates the body and converts it into an engine request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when any field is malformed.
    pub fn into_decision_request(self) -> Result<DecisionRequest, RequestError> {
        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err(RequestError::MissingField("userId"));
        }
        if user_id.len() > MAX_USER_ID_LENGTH {
            return Err(RequestError::TooLong("userId"));
        }
        let permission = Permission::parse(&self.permission)
            .map_err(|err| RequestError::InvalidPermission(err.to_string()))?;
        let mut request = DecisionRequest::new(user_id, permission);
        if let Some(organization_id) = self.organization_id {
            request = request.with_organization(parse_uuid("organizationId", &organization_id)?);
        }
        if let Some(workspace_id) = self.workspace_id {
            request = request.with_workspace(parse_uuid("workspaceId", &workspace_id)?);
        }
        if let Some(role) = self.user_role {
            if role.len() > MAX_USER_ROLE_LENGTH {
                return Err(RequestError::TooLong("userRole"));
            }
            request = request.with_role(role);
        }
        Ok(request)
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error message.
    pub error: String,
}

impl ErrorBody {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health response body.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthBody {
    /// Liveness status label.
    pub status: &'static str,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Body is not valid JSON for the request shape.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    /// Required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Field exceeds its length limit.
    #[error("field too long: {0}")]
    TooLong(&'static str),
    /// Scope identifier is not a UUID.
    #[error("{0} must be a uuid")]
    InvalidUuid(&'static str),
    /// Permission string is malformed.
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a JSON body into a validated engine request.
///
/// # Errors
///
/// Returns [`RequestError`] when the body or any field is malformed.
pub fn parse_decision_request(bytes: &[u8]) -> Result<DecisionRequest, RequestError> {
    let body: AuthorizeRequest =
        serde_json::from_slice(bytes).map_err(|err| RequestError::InvalidBody(err.to_string()))?;
    body.into_decision_request()
}

/// Parses a scope identifier as a UUID, keeping its canonical lowercase form.
fn parse_uuid(field: &'static str, value: &str) -> Result<String, RequestError> {
    uuid::Uuid::parse_str(value)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| RequestError::InvalidUuid(field))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
