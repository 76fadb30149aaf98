// crates/authz-gate-core/src/core/decision.rs
// ============================================================================
// Module: Decision Types
// Description: Decision requests, verdicts, and stable reason codes.
// Purpose: Define the engine's input and output contract.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`DecisionRequest`] carries an already-authenticated principal, optional
//! organization and workspace scopes, a parsed [`Permission`], and an
//! optional global role claim. The engine answers with a [`Verdict`] whose
//! [`DecisionReason`] is present on every denial and on the notable allow
//! paths. Reason codes serialize as stable kebab-case strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OrganizationId;
use crate::core::identifiers::PrincipalId;
use crate::core::identifiers::WorkspaceId;
use crate::core::permission::Permission;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Input to a single authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    /// Authenticated principal.
    pub principal_id: PrincipalId,
    /// Organization scope for `org:` permissions.
    pub organization_id: Option<OrganizationId>,
    /// Workspace scope for `workspace:` permissions.
    pub workspace_id: Option<WorkspaceId>,
    /// Requested permission.
    pub permission: Permission,
    /// Pre-validated global role claim.
    pub principal_role: Option<String>,
}

impl DecisionRequest {
    /// Creates a request with no scopes and no role claim.
    #[must_use]
    pub fn new(principal_id: impl Into<PrincipalId>, permission: Permission) -> Self {
        Self {
            principal_id: principal_id.into(),
            organization_id: None,
            workspace_id: None,
            permission,
            principal_role: None,
        }
    }

    /// Sets the organization scope.
    #[must_use]
    pub fn with_organization(mut self, organization_id: impl Into<OrganizationId>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Sets the workspace scope.
    #[must_use]
    pub fn with_workspace(mut self, workspace_id: impl Into<WorkspaceId>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Sets the global role claim.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.principal_role = Some(role.into());
        self
    }
}

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Stable machine-readable decision reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionReason {
    /// Global super-admin claim bypassed all checks.
    SuperAdmin,
    /// Organization administrator override of workspace membership.
    OrganizationAdminOverride,
    /// `org:` permission requested without an organization scope.
    MissingOrganizationId,
    /// `workspace:` permission requested without a workspace scope.
    MissingWorkspaceId,
    /// Workspace has no owning organization.
    WorkspaceNotFound,
    /// No organization membership, or the role lacks the permission.
    InsufficientOrganizationPermission,
    /// No workspace membership, or the role lacks the permission.
    InsufficientPermission,
    /// A membership lookup failed or timed out.
    ResolverUnavailable,
}

impl DecisionReason {
    /// Returns the wire label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super-admin",
            Self::OrganizationAdminOverride => "organization-admin-override",
            Self::MissingOrganizationId => "missing-organization-id",
            Self::MissingWorkspaceId => "missing-workspace-id",
            Self::WorkspaceNotFound => "workspace-not-found",
            Self::InsufficientOrganizationPermission => "insufficient-organization-permission",
            Self::InsufficientPermission => "insufficient-permission",
            Self::ResolverUnavailable => "resolver-unavailable",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow/deny outcome of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the permission is granted.
    pub allowed: bool,
    /// Reason code; always set on denial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DecisionReason>,
}

impl Verdict {
    /// Plain allow without a notable reason.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// Allow with a notable reason.
    #[must_use]
    pub const fn allow_because(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason: Some(reason),
        }
    }

    /// Deny with a reason.
    #[must_use]
    pub const fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
