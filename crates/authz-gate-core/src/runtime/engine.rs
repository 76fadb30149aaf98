// crates/authz-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: Authorization Engine
// Description: Permission resolution over organization and workspace tenancy.
// Purpose: Turn a decision request into a fail-closed verdict.
// Dependencies: crate::core, crate::interfaces, tokio
// ============================================================================

//! ## Overview
//! [`AuthorizationEngine`] evaluates a [`DecisionRequest`] in a fixed order:
//! the super-admin bypass, then dispatch on the permission scope, then the
//! organization or workspace check. Workspace checks honor the organization
//! administrator override and the rule that an `:all` grant implies the
//! matching `:own` permission.
//!
//! The engine holds no mutable state. Each resolver lookup is bounded by the
//! configured timeout, lookups within a decision run sequentially, and any
//! resolver error or timeout becomes a `resolver-unavailable` denial. Nothing
//! escapes the public boundary as an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use crate::core::DecisionReason;
use crate::core::DecisionRequest;
use crate::core::OrganizationId;
use crate::core::Permission;
use crate::core::PermissionScope;
use crate::core::PrincipalId;
use crate::core::Verdict;
use crate::core::WorkspaceId;
use crate::interfaces::MembershipResolver;
use crate::interfaces::ResolverError;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Default global role claim that bypasses all checks.
pub const DEFAULT_SUPER_ADMIN_ROLE: &str = "admin";
/// Default organization permission that overrides workspace membership.
pub const DEFAULT_ORG_ADMIN_PERMISSION: &str = "org:workspaces";
/// Default per-lookup timeout.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Global role claim that triggers the super-admin bypass.
    pub super_admin_role: String,
    /// Organization permission granting access to every workspace of the organization.
    pub org_admin_permission: Permission,
    /// Timeout applied to every resolver lookup.
    pub lookup_timeout: Duration,
}

impl EngineConfig {
    /// Builds a configuration with explicit values.
    #[must_use]
    pub fn new(
        super_admin_role: impl Into<String>,
        org_admin_permission: Permission,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            super_admin_role: super_admin_role.into(),
            org_admin_permission,
            lookup_timeout,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            super_admin_role: DEFAULT_SUPER_ADMIN_ROLE.to_string(),
            org_admin_permission: Permission::from_trusted_parts(
                DEFAULT_ORG_ADMIN_PERMISSION,
                PermissionScope::Organization,
                None,
            ),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Stateless authorization decision engine.
#[derive(Debug, Clone)]
pub struct AuthorizationEngine<R> {
    /// Membership resolver.
    resolver: R,
    /// Engine configuration.
    config: EngineConfig,
}

impl<R> AuthorizationEngine<R>
where
    R: MembershipResolver,
{
    /// Creates an engine over a resolver.
    #[must_use]
    pub const fn new(resolver: R, config: EngineConfig) -> Self {
        Self {
            resolver,
            config,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the membership resolver.
    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Decides whether the request is allowed.
    pub async fn decide(&self, request: &DecisionRequest) -> Verdict {
        match self.evaluate(request).await {
            Ok(verdict) => verdict,
            Err(_) => Verdict::deny(DecisionReason::ResolverUnavailable),
        }
    }

    /// Decides within an overall deadline; exceeding it denies.
    pub async fn decide_within(&self, request: &DecisionRequest, deadline: Duration) -> Verdict {
        tokio::time::timeout(deadline, self.decide(request))
            .await
            .unwrap_or(Verdict::deny(DecisionReason::ResolverUnavailable))
    }

    /// Runs the resolution algorithm, surfacing resolver failures.
    async fn evaluate(&self, request: &DecisionRequest) -> Result<Verdict, ResolverError> {
        if request.principal_role.as_deref() == Some(self.config.super_admin_role.as_str()) {
            return Ok(Verdict::allow_because(DecisionReason::SuperAdmin));
        }
        match request.permission.scope() {
            PermissionScope::Organization => {
                self.check_organization(
                    &request.principal_id,
                    request.organization_id.as_ref(),
                    &request.permission,
                )
                .await
            }
            PermissionScope::Workspace => {
                self.check_workspace(
                    &request.principal_id,
                    request.workspace_id.as_ref(),
                    &request.permission,
                )
                .await
            }
        }
    }

    /// Resolves an `org:` permission against organization membership.
    async fn check_organization(
        &self,
        principal_id: &PrincipalId,
        organization_id: Option<&OrganizationId>,
        permission: &Permission,
    ) -> Result<Verdict, ResolverError> {
        let Some(organization_id) = organization_id else {
            return Ok(Verdict::deny(DecisionReason::MissingOrganizationId));
        };
        let membership = self
            .bounded(self.resolver.find_organization_membership(principal_id, organization_id))
            .await?;
        let Some(role_id) = membership else {
            return Ok(Verdict::deny(DecisionReason::InsufficientOrganizationPermission));
        };
        if self.bounded(self.resolver.has_role_permission(&role_id, permission)).await? {
            return Ok(Verdict::allow());
        }
        Ok(Verdict::deny(DecisionReason::InsufficientOrganizationPermission))
    }

    /// Resolves a `workspace:` permission with the org-admin override and `:own` fallback.
    async fn check_workspace(
        &self,
        principal_id: &PrincipalId,
        workspace_id: Option<&WorkspaceId>,
        permission: &Permission,
    ) -> Result<Verdict, ResolverError> {
        let Some(workspace_id) = workspace_id else {
            return Ok(Verdict::deny(DecisionReason::MissingWorkspaceId));
        };
        let owner = self.bounded(self.resolver.find_workspace_organization(workspace_id)).await?;
        let Some(organization_id) = owner else {
            return Ok(Verdict::deny(DecisionReason::WorkspaceNotFound));
        };

        let org_role = self
            .bounded(self.resolver.find_organization_membership(principal_id, &organization_id))
            .await?;
        if let Some(org_role) = org_role
            && self
                .bounded(
                    self.resolver.has_role_permission(&org_role, &self.config.org_admin_permission),
                )
                .await?
        {
            return Ok(Verdict::allow_because(DecisionReason::OrganizationAdminOverride));
        }

        let membership =
            self.bounded(self.resolver.find_workspace_membership(principal_id, workspace_id)).await?;
        let Some(role_id) = membership else {
            return Ok(Verdict::deny(DecisionReason::InsufficientPermission));
        };
        if self.bounded(self.resolver.has_role_permission(&role_id, permission)).await? {
            return Ok(Verdict::allow());
        }
        if let Some(unrestricted) = permission.unrestricted_equivalent()
            && self.bounded(self.resolver.has_role_permission(&role_id, &unrestricted)).await?
        {
            return Ok(Verdict::allow());
        }
        Ok(Verdict::deny(DecisionReason::InsufficientPermission))
    }

    /// Applies the per-lookup timeout to a resolver call.
    async fn bounded<T>(
        &self,
        lookup: impl Future<Output = Result<T, ResolverError>>,
    ) -> Result<T, ResolverError> {
        tokio::time::timeout(self.config.lookup_timeout, lookup).await.map_err(|_| {
            ResolverError::Timeout(format!(
                "lookup exceeded {} ms",
                self.config.lookup_timeout.as_millis()
            ))
        })?
    }
}
