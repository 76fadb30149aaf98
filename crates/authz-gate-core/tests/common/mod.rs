// crates/authz-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Catalog and tenancy fixtures for engine tests.
// Purpose: Provide one realistic two-organization tenancy layout.
// Dependencies: authz-gate-core
// ============================================================================

//! Shared fixtures: two organizations, one workspace each, and principals
//! covering every membership shape the engine distinguishes.

#![allow(dead_code, reason = "Not every test binary uses every fixture.")]

use std::sync::Arc;

use authz_gate_core::AuthorizationEngine;
use authz_gate_core::CatalogDocument;
use authz_gate_core::EngineConfig;
use authz_gate_core::InMemoryMembershipResolver;
use authz_gate_core::OrganizationId;
use authz_gate_core::Permission;
use authz_gate_core::PermissionCatalog;
use authz_gate_core::PermissionDefinition;
use authz_gate_core::PrincipalId;
use authz_gate_core::RoleDefinition;
use authz_gate_core::RoleId;
use authz_gate_core::WorkspaceId;

pub const ORG_ID: &str = "0b6f7f57-4d5b-4f7e-9a51-6c8e2f0d1a01";
pub const OTHER_ORG_ID: &str = "0b6f7f57-4d5b-4f7e-9a51-6c8e2f0d1a02";
pub const WORKSPACE_ID: &str = "7c1d2e3f-1111-4a2b-8c3d-000000000001";
pub const OTHER_WORKSPACE_ID: &str = "7c1d2e3f-1111-4a2b-8c3d-000000000002";
pub const UNKNOWN_WORKSPACE_ID: &str = "7c1d2e3f-1111-4a2b-8c3d-0000000000ff";

pub const ORG_OWNER: &str = "user-org-owner";
pub const ORG_MEMBER: &str = "user-org-member";
pub const WS_OWNER: &str = "user-ws-owner";
pub const WS_MEMBER: &str = "user-ws-member";
pub const WS_VIEWER: &str = "user-ws-viewer";
pub const STRANGER: &str = "user-stranger";

pub fn permission(id: &str) -> Permission {
    Permission::parse(id).expect("fixture permission")
}

fn role(id: &str, permissions: &[&str]) -> RoleDefinition {
    RoleDefinition {
        id: RoleId::new(id),
        name: id.to_string(),
        permissions: permissions.iter().map(|id| permission(id)).collect(),
    }
}

pub fn catalog() -> PermissionCatalog {
    let declared = [
        "org:manage",
        "org:users",
        "org:workspaces",
        "org:settings",
        "workspace:admin",
        "workspace:task:read",
        "workspace:task:create",
        "workspace:task:update:own",
        "workspace:task:update:all",
        "workspace:task:delete:own",
        "workspace:task:delete:all",
        "workspace:document:read",
        "workspace:document:write",
        "workspace:document:delete",
    ];
    let document = CatalogDocument {
        permissions: declared
            .iter()
            .map(|id| PermissionDefinition {
                id: permission(id),
                description: String::new(),
            })
            .collect(),
        roles: vec![
            role("org:owner", &["org:manage", "org:users", "org:workspaces", "org:settings"]),
            role("org:admin", &["org:manage", "org:users", "org:workspaces", "org:settings"]),
            role("org:member", &[]),
            role(
                "workspace:owner",
                &[
                    "workspace:admin",
                    "workspace:task:read",
                    "workspace:task:update:all",
                    "workspace:task:delete:all",
                    "workspace:document:read",
                    "workspace:document:write",
                    "workspace:document:delete",
                ],
            ),
            role(
                "workspace:member",
                &[
                    "workspace:task:read",
                    "workspace:task:create",
                    "workspace:task:update:own",
                    "workspace:task:delete:own",
                    "workspace:document:read",
                    "workspace:document:write",
                ],
            ),
            role("workspace:viewer", &["workspace:task:read", "workspace:document:read"]),
        ],
    };
    PermissionCatalog::from_document(document).expect("fixture catalog")
}

pub fn resolver() -> InMemoryMembershipResolver {
    let resolver = InMemoryMembershipResolver::new(Arc::new(catalog()));
    resolver
        .put_workspace(WorkspaceId::new(WORKSPACE_ID), OrganizationId::new(ORG_ID))
        .expect("workspace");
    resolver
        .put_workspace(WorkspaceId::new(OTHER_WORKSPACE_ID), OrganizationId::new(OTHER_ORG_ID))
        .expect("workspace");
    let org_members = [(ORG_OWNER, "org:owner"), (ORG_MEMBER, "org:member"), (WS_MEMBER, "org:member")];
    for (principal, role) in org_members {
        resolver
            .put_organization_member(
                PrincipalId::new(principal),
                OrganizationId::new(ORG_ID),
                RoleId::new(role),
            )
            .expect("org member");
    }
    let ws_members =
        [(WS_OWNER, "workspace:owner"), (WS_MEMBER, "workspace:member"), (WS_VIEWER, "workspace:viewer")];
    for (principal, role) in ws_members {
        resolver
            .put_workspace_member(
                PrincipalId::new(principal),
                WorkspaceId::new(WORKSPACE_ID),
                RoleId::new(role),
            )
            .expect("workspace member");
    }
    resolver
}

pub fn engine() -> AuthorizationEngine<InMemoryMembershipResolver> {
    AuthorizationEngine::new(resolver(), EngineConfig::default())
}
