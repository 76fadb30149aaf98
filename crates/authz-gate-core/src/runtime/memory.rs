// crates/authz-gate-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Membership Resolver
// Description: Map-backed membership resolver and shared resolver handle.
// Purpose: Provide a deterministic resolver for tests, fixtures, and demos.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryMembershipResolver`] keeps workspaces and memberships in ordered
//! maps behind a mutex and answers role permission lookups from an immutable
//! [`PermissionCatalog`]. Keying memberships by (principal, scope) keeps
//! them unique per pair. A workspace's parent organization is fixed once
//! recorded. [`SharedMembershipResolver`] wraps any resolver in an `Arc`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;

use crate::core::OrganizationId;
use crate::core::Permission;
use crate::core::PermissionCatalog;
use crate::core::PrincipalId;
use crate::core::RoleId;
use crate::core::WorkspaceId;
use crate::interfaces::MembershipResolver;
use crate::interfaces::ResolverError;

// ============================================================================
// SECTION: In-Memory Resolver
// ============================================================================

/// Mutable tenancy tables.
#[derive(Debug, Default)]
struct MembershipTables {
    /// Workspace → owning organization.
    workspaces: BTreeMap<WorkspaceId, OrganizationId>,
    /// (principal, organization) → role.
    organization_members: BTreeMap<(PrincipalId, OrganizationId), RoleId>,
    /// (principal, workspace) → role.
    workspace_members: BTreeMap<(PrincipalId, WorkspaceId), RoleId>,
}

/// In-memory membership resolver for tests and local fixtures.
#[derive(Debug, Clone)]
pub struct InMemoryMembershipResolver {
    /// Immutable role permission table.
    catalog: Arc<PermissionCatalog>,
    /// Tenancy tables protected by a mutex.
    tables: Arc<Mutex<MembershipTables>>,
}

impl InMemoryMembershipResolver {
    /// Creates an empty resolver over a catalog.
    #[must_use]
    pub fn new(catalog: Arc<PermissionCatalog>) -> Self {
        Self {
            catalog,
            tables: Arc::new(Mutex::new(MembershipTables::default())),
        }
    }

    /// Returns the catalog backing role permission lookups.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Records a workspace under its owning organization.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Invalid`] when the workspace is already owned
    /// by a different organization.
    pub fn put_workspace(
        &self,
        workspace_id: WorkspaceId,
        organization_id: OrganizationId,
    ) -> Result<(), ResolverError> {
        let mut tables = self.lock()?;
        match tables.workspaces.get(&workspace_id) {
            Some(existing) if existing != &organization_id => Err(ResolverError::Invalid(format!(
                "workspace {workspace_id} already belongs to organization {existing}"
            ))),
            Some(_) => Ok(()),
            None => {
                tables.workspaces.insert(workspace_id, organization_id);
                Ok(())
            }
        }
    }

    /// Assigns or replaces a principal's organization role.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the tables are unavailable.
    pub fn put_organization_member(
        &self,
        principal_id: PrincipalId,
        organization_id: OrganizationId,
        role_id: RoleId,
    ) -> Result<(), ResolverError> {
        self.lock()?.organization_members.insert((principal_id, organization_id), role_id);
        Ok(())
    }

    /// Assigns or replaces a principal's workspace role.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the tables are unavailable.
    pub fn put_workspace_member(
        &self,
        principal_id: PrincipalId,
        workspace_id: WorkspaceId,
        role_id: RoleId,
    ) -> Result<(), ResolverError> {
        self.lock()?.workspace_members.insert((principal_id, workspace_id), role_id);
        Ok(())
    }

    /// Removes a principal's organization membership, returning the old role.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the tables are unavailable.
    pub fn remove_organization_member(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let key = (principal_id.clone(), organization_id.clone());
        Ok(self.lock()?.organization_members.remove(&key))
    }

    /// Removes a principal's workspace membership, returning the old role.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the tables are unavailable.
    pub fn remove_workspace_member(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let key = (principal_id.clone(), workspace_id.clone());
        Ok(self.lock()?.workspace_members.remove(&key))
    }

    /// Locks the tenancy tables.
    fn lock(&self) -> Result<MutexGuard<'_, MembershipTables>, ResolverError> {
        self.tables
            .lock()
            .map_err(|_| ResolverError::Unavailable("membership tables mutex poisoned".to_string()))
    }
}

#[async_trait]
impl MembershipResolver for InMemoryMembershipResolver {
    async fn find_organization_membership(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let key = (principal_id.clone(), organization_id.clone());
        Ok(self.lock()?.organization_members.get(&key).cloned())
    }

    async fn find_workspace_membership(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let key = (principal_id.clone(), workspace_id.clone());
        Ok(self.lock()?.workspace_members.get(&key).cloned())
    }

    async fn has_role_permission(
        &self,
        role_id: &RoleId,
        permission: &Permission,
    ) -> Result<bool, ResolverError> {
        Ok(self.catalog.has_role_permission(role_id, permission))
    }

    async fn find_workspace_organization(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<OrganizationId>, ResolverError> {
        Ok(self.lock()?.workspaces.get(workspace_id).cloned())
    }
}

// ============================================================================
// SECTION: Shared Resolver
// ============================================================================

/// Shared membership resolver backed by a trait object.
#[derive(Clone)]
pub struct SharedMembershipResolver {
    /// Inner resolver implementation.
    inner: Arc<dyn MembershipResolver>,
}

impl SharedMembershipResolver {
    /// Wraps a resolver implementation in a shared handle.
    #[must_use]
    pub fn from_resolver(resolver: impl MembershipResolver + 'static) -> Self {
        Self {
            inner: Arc::new(resolver),
        }
    }

    /// Wraps an existing shared resolver.
    #[must_use]
    pub fn new(inner: Arc<dyn MembershipResolver>) -> Self {
        Self {
            inner,
        }
    }
}

#[async_trait]
impl MembershipResolver for SharedMembershipResolver {
    async fn find_organization_membership(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
    ) -> Result<Option<RoleId>, ResolverError> {
        self.inner.find_organization_membership(principal_id, organization_id).await
    }

    async fn find_workspace_membership(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<RoleId>, ResolverError> {
        self.inner.find_workspace_membership(principal_id, workspace_id).await
    }

    async fn has_role_permission(
        &self,
        role_id: &RoleId,
        permission: &Permission,
    ) -> Result<bool, ResolverError> {
        self.inner.has_role_permission(role_id, permission).await
    }

    async fn find_workspace_organization(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<OrganizationId>, ResolverError> {
        self.inner.find_workspace_organization(workspace_id).await
    }
}
