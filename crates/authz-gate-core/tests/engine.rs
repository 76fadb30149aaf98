// crates/authz-gate-core/tests/engine.rs
// ============================================================================
// Module: Authorization Engine Tests
// Description: Scenario tests for organization and workspace decisions.
// Purpose: Pin the resolution order, reason codes, and fail-closed behavior.
// Dependencies: authz-gate-core, tokio
// ============================================================================
//! ## Overview
//! Exercises every decision path: super-admin bypass, organization checks,
//! workspace checks with the org-admin override, the `:own` fallback, and
//! resolver failures.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authz_gate_core::AuthorizationEngine;
use authz_gate_core::DecisionReason;
use authz_gate_core::DecisionRequest;
use authz_gate_core::EngineConfig;
use authz_gate_core::InMemoryMembershipResolver;
use authz_gate_core::MembershipResolver;
use authz_gate_core::OrganizationId;
use authz_gate_core::Permission;
use authz_gate_core::PrincipalId;
use authz_gate_core::ResolverError;
use authz_gate_core::RoleId;
use authz_gate_core::SharedMembershipResolver;
use authz_gate_core::Verdict;
use authz_gate_core::WorkspaceId;
use common::ORG_ID;
use common::ORG_MEMBER;
use common::ORG_OWNER;
use common::OTHER_ORG_ID;
use common::OTHER_WORKSPACE_ID;
use common::STRANGER;
use common::UNKNOWN_WORKSPACE_ID;
use common::WORKSPACE_ID;
use common::WS_MEMBER;
use common::WS_OWNER;
use common::WS_VIEWER;
use common::catalog;
use common::engine;
use common::permission;

fn workspace_request(principal: &str, permission_id: &str) -> DecisionRequest {
    DecisionRequest::new(principal, permission(permission_id)).with_workspace(WORKSPACE_ID)
}

// ============================================================================
// SECTION: Super-Admin
// ============================================================================

#[tokio::test]
async fn super_admin_bypasses_missing_scopes() {
    let engine = engine();
    let request = DecisionRequest::new(STRANGER, permission("org:manage")).with_role("admin");
    assert_eq!(engine.decide(&request).await, Verdict::allow_because(DecisionReason::SuperAdmin));

    let request =
        DecisionRequest::new(STRANGER, permission("workspace:task:delete:all")).with_role("admin");
    assert_eq!(engine.decide(&request).await, Verdict::allow_because(DecisionReason::SuperAdmin));
}

#[tokio::test]
async fn other_role_claims_do_not_bypass() {
    let engine = engine();
    let request = DecisionRequest::new(STRANGER, permission("org:manage"))
        .with_organization(ORG_ID)
        .with_role("Admin");
    assert_eq!(
        engine.decide(&request).await,
        Verdict::deny(DecisionReason::InsufficientOrganizationPermission)
    );
}

#[tokio::test]
async fn super_admin_marker_is_configurable() {
    let config = EngineConfig {
        super_admin_role: "platform-root".to_string(),
        ..EngineConfig::default()
    };
    let engine = AuthorizationEngine::new(common::resolver(), config);
    let admin = DecisionRequest::new(STRANGER, permission("org:users")).with_role("admin");
    assert_eq!(
        engine.decide(&admin).await,
        Verdict::deny(DecisionReason::MissingOrganizationId)
    );
    let root = DecisionRequest::new(STRANGER, permission("org:users")).with_role("platform-root");
    assert!(engine.decide(&root).await.allowed);
}

// ============================================================================
// SECTION: Organization Scope
// ============================================================================

#[tokio::test]
async fn org_permission_requires_organization_id() {
    let engine = engine();
    let request = DecisionRequest::new(ORG_OWNER, permission("org:manage"));
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::MissingOrganizationId));
}

#[tokio::test]
async fn org_owner_holds_org_permissions() {
    let engine = engine();
    let request = DecisionRequest::new(ORG_OWNER, permission("org:users")).with_organization(ORG_ID);
    assert_eq!(engine.decide(&request).await, Verdict::allow());
}

#[tokio::test]
async fn org_member_lacks_org_permissions() {
    let engine = engine();
    let request = DecisionRequest::new(ORG_MEMBER, permission("org:users")).with_organization(ORG_ID);
    assert_eq!(
        engine.decide(&request).await,
        Verdict::deny(DecisionReason::InsufficientOrganizationPermission)
    );
}

#[tokio::test]
async fn non_member_denied_in_foreign_organization() {
    let engine = engine();
    let request =
        DecisionRequest::new(ORG_OWNER, permission("org:users")).with_organization(OTHER_ORG_ID);
    assert_eq!(
        engine.decide(&request).await,
        Verdict::deny(DecisionReason::InsufficientOrganizationPermission)
    );
}

#[tokio::test]
async fn org_permission_ignores_workspace_scope() {
    let engine = engine();
    let request = DecisionRequest::new(ORG_OWNER, permission("org:settings"))
        .with_workspace(WORKSPACE_ID);
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::MissingOrganizationId));
}

// ============================================================================
// SECTION: Workspace Scope
// ============================================================================

#[tokio::test]
async fn workspace_permission_requires_workspace_id() {
    let engine = engine();
    let request =
        DecisionRequest::new(WS_MEMBER, permission("workspace:task:read")).with_organization(ORG_ID);
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::MissingWorkspaceId));
}

#[tokio::test]
async fn unknown_workspace_is_not_found() {
    let engine = engine();
    let request = DecisionRequest::new(WS_MEMBER, permission("workspace:task:read"))
        .with_workspace(UNKNOWN_WORKSPACE_ID);
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::WorkspaceNotFound));
}

#[tokio::test]
async fn org_owner_overrides_workspace_membership() {
    let engine = engine();
    let request = workspace_request(ORG_OWNER, "workspace:document:write");
    assert_eq!(
        engine.decide(&request).await,
        Verdict::allow_because(DecisionReason::OrganizationAdminOverride)
    );
}

#[tokio::test]
async fn org_override_does_not_cross_organizations() {
    let engine = engine();
    let request = DecisionRequest::new(ORG_OWNER, permission("workspace:document:write"))
        .with_workspace(OTHER_WORKSPACE_ID);
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::InsufficientPermission));
}

#[tokio::test]
async fn org_member_without_workspace_role_is_denied() {
    let engine = engine();
    let request = workspace_request(ORG_MEMBER, "workspace:task:read");
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::InsufficientPermission));
}

#[tokio::test]
async fn viewer_reads_but_cannot_write_or_delete() {
    let engine = engine();
    assert!(engine.decide(&workspace_request(WS_VIEWER, "workspace:task:read")).await.allowed);
    for denied in ["workspace:document:write", "workspace:document:delete"] {
        assert_eq!(
            engine.decide(&workspace_request(WS_VIEWER, denied)).await,
            Verdict::deny(DecisionReason::InsufficientPermission)
        );
    }
}

#[tokio::test]
async fn member_own_grant_does_not_imply_all() {
    let engine = engine();
    assert_eq!(
        engine.decide(&workspace_request(WS_MEMBER, "workspace:task:update:own")).await,
        Verdict::allow()
    );
    assert_eq!(
        engine.decide(&workspace_request(WS_MEMBER, "workspace:task:update:all")).await,
        Verdict::deny(DecisionReason::InsufficientPermission)
    );
}

#[tokio::test]
async fn owner_all_grant_implies_own() {
    let engine = engine();
    assert_eq!(
        engine.decide(&workspace_request(WS_OWNER, "workspace:task:update:own")).await,
        Verdict::allow()
    );
    assert_eq!(
        engine.decide(&workspace_request(WS_OWNER, "workspace:task:delete:own")).await,
        Verdict::allow()
    );
}

#[tokio::test]
async fn stranger_is_denied() {
    let engine = engine();
    assert_eq!(
        engine.decide(&workspace_request(STRANGER, "workspace:task:read")).await,
        Verdict::deny(DecisionReason::InsufficientPermission)
    );
}

#[tokio::test]
async fn membership_removal_takes_effect() {
    let engine = engine();
    let request = workspace_request(WS_VIEWER, "workspace:task:read");
    assert!(engine.decide(&request).await.allowed);
    engine
        .resolver()
        .remove_workspace_member(&PrincipalId::new(WS_VIEWER), &WorkspaceId::new(WORKSPACE_ID))
        .unwrap();
    assert!(!engine.decide(&request).await.allowed);
}

#[tokio::test]
async fn workspace_parent_is_immutable() {
    let resolver = common::resolver();
    let moved =
        resolver.put_workspace(WorkspaceId::new(WORKSPACE_ID), OrganizationId::new(OTHER_ORG_ID));
    assert!(matches!(moved, Err(ResolverError::Invalid(_))));
    assert!(
        resolver.put_workspace(WorkspaceId::new(WORKSPACE_ID), OrganizationId::new(ORG_ID)).is_ok()
    );
}

#[tokio::test]
async fn repeated_decisions_are_identical() {
    let engine = engine();
    let request = workspace_request(WS_MEMBER, "workspace:task:delete:all");
    let first = engine.decide(&request).await;
    for _ in 0 .. 10 {
        assert_eq!(engine.decide(&request).await, first);
    }
}

// ============================================================================
// SECTION: Resolver Failures
// ============================================================================

/// Resolver whose lookups either fail or never finish.
struct BrokenResolver {
    hang: bool,
}

impl BrokenResolver {
    async fn fail<T>(&self) -> Result<T, ResolverError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(ResolverError::Unavailable("backend offline".to_string()))
    }
}

#[async_trait]
impl MembershipResolver for BrokenResolver {
    async fn find_organization_membership(
        &self,
        _principal_id: &PrincipalId,
        _organization_id: &OrganizationId,
    ) -> Result<Option<RoleId>, ResolverError> {
        self.fail().await
    }

    async fn find_workspace_membership(
        &self,
        _principal_id: &PrincipalId,
        _workspace_id: &WorkspaceId,
    ) -> Result<Option<RoleId>, ResolverError> {
        self.fail().await
    }

    async fn has_role_permission(
        &self,
        _role_id: &RoleId,
        _permission: &Permission,
    ) -> Result<bool, ResolverError> {
        self.fail().await
    }

    async fn find_workspace_organization(
        &self,
        _workspace_id: &WorkspaceId,
    ) -> Result<Option<OrganizationId>, ResolverError> {
        self.fail().await
    }
}

#[tokio::test]
async fn resolver_error_fails_closed() {
    let engine = AuthorizationEngine::new(
        SharedMembershipResolver::from_resolver(BrokenResolver {
            hang: false,
        }),
        EngineConfig::default(),
    );
    let request = DecisionRequest::new(ORG_OWNER, permission("org:users")).with_organization(ORG_ID);
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::ResolverUnavailable));
    let request = workspace_request(WS_MEMBER, "workspace:task:read");
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::ResolverUnavailable));
}

#[tokio::test]
async fn resolver_timeout_fails_closed() {
    let config = EngineConfig {
        lookup_timeout: Duration::from_millis(20),
        ..EngineConfig::default()
    };
    let engine = AuthorizationEngine::new(
        BrokenResolver {
            hang: true,
        },
        config,
    );
    let request = workspace_request(WS_MEMBER, "workspace:task:read");
    assert_eq!(engine.decide(&request).await, Verdict::deny(DecisionReason::ResolverUnavailable));
}

#[tokio::test]
async fn overall_deadline_fails_closed() {
    let engine = AuthorizationEngine::new(
        BrokenResolver {
            hang: true,
        },
        EngineConfig::default(),
    );
    let request = workspace_request(WS_MEMBER, "workspace:task:read");
    let verdict = engine.decide_within(&request, Duration::from_millis(20)).await;
    assert_eq!(verdict, Verdict::deny(DecisionReason::ResolverUnavailable));
}

#[tokio::test]
async fn super_admin_needs_no_resolver() {
    let engine = AuthorizationEngine::new(
        BrokenResolver {
            hang: false,
        },
        EngineConfig::default(),
    );
    let request = workspace_request(STRANGER, "workspace:task:read").with_role("admin");
    assert!(engine.decide(&request).await.allowed);
}

// ============================================================================
// SECTION: Scope Id Forms
// ============================================================================

#[tokio::test]
async fn scope_ids_match_across_uuid_spellings() {
    let resolver = InMemoryMembershipResolver::new(Arc::new(catalog()));
    resolver
        .put_workspace(
            WorkspaceId::new("7C1D2E3F-1111-4A2B-8C3D-000000000001"),
            OrganizationId::new("0B6F7F57-4D5B-4F7E-9A51-6C8E2F0D1A01"),
        )
        .unwrap();
    resolver
        .put_workspace_member(
            PrincipalId::new(WS_VIEWER),
            WorkspaceId::new("{7c1d2e3f-1111-4a2b-8c3d-000000000001}"),
            RoleId::new("workspace:viewer"),
        )
        .unwrap();
    resolver
        .put_organization_member(
            PrincipalId::new(ORG_OWNER),
            OrganizationId::new("urn:uuid:0b6f7f57-4d5b-4f7e-9a51-6c8e2f0d1a01"),
            RoleId::new("org:owner"),
        )
        .unwrap();
    let engine = AuthorizationEngine::new(resolver, EngineConfig::default());

    let viewer = DecisionRequest::new(WS_VIEWER, permission("workspace:task:read"))
        .with_workspace("7c1d2e3f11114a2b8c3d000000000001");
    assert_eq!(engine.decide(&viewer).await, Verdict::allow());

    let owner = DecisionRequest::new(ORG_OWNER, permission("workspace:document:delete"))
        .with_workspace(WORKSPACE_ID);
    assert_eq!(
        engine.decide(&owner).await,
        Verdict::allow_because(DecisionReason::OrganizationAdminOverride)
    );

    let org = DecisionRequest::new(ORG_OWNER, permission("org:settings")).with_organization(ORG_ID);
    assert_eq!(engine.decide(&org).await, Verdict::allow());
}
