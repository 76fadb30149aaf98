// crates/authz-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Authz Gate Interfaces
// Description: Backend-agnostic membership resolver contract.
// Purpose: Let the decision engine run against any membership store.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! The engine reads tenancy data only through [`MembershipResolver`]. It has
//! exactly four read operations; "not found" is a value (`None` / `false`),
//! never an error. Errors mean the backend could not answer, and the engine
//! turns every one of them into a fail-closed denial.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::OrganizationId;
use crate::core::Permission;
use crate::core::PrincipalId;
use crate::core::RoleId;
use crate::core::WorkspaceId;

// ============================================================================
// SECTION: Membership Resolver
// ============================================================================

/// Membership resolver errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// Backend could not be reached or failed.
    #[error("membership resolver unavailable: {0}")]
    Unavailable(String),
    /// Lookup exceeded its deadline.
    #[error("membership resolver timed out: {0}")]
    Timeout(String),
    /// Backend returned data that violates tenancy invariants.
    #[error("membership resolver invalid data: {0}")]
    Invalid(String),
}

/// Read contract over memberships, workspaces, and role permissions.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Returns the principal's role in an organization.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the lookup cannot be answered.
    async fn find_organization_membership(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
    ) -> Result<Option<RoleId>, ResolverError>;

    /// Returns the principal's role in a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the lookup cannot be answered.
    async fn find_workspace_membership(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<RoleId>, ResolverError>;

    /// Returns true when the role grants the permission.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the lookup cannot be answered.
    async fn has_role_permission(
        &self,
        role_id: &RoleId,
        permission: &Permission,
    ) -> Result<bool, ResolverError>;

    /// Returns the organization that owns a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the lookup cannot be answered.
    async fn find_workspace_organization(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<OrganizationId>, ResolverError>;
}
