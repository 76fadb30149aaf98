// crates/authz-gate-server/src/resolver.rs
// ============================================================================
// Module: Resolver Wiring
// Description: Builds the configured membership resolver.
// Purpose: Turn `[resolver]` config into a shared, optionally cached resolver.
// Dependencies: authz-gate-config, authz-gate-core, authz-gate-store-sqlite
// ============================================================================

//! ## Overview
//! The memory backend is seeded from config fixtures; the sqlite backend is
//! opened and its catalog mirror replaced with the loaded catalog. Either
//! backend may sit behind the TTL cache. Fixture roles must be declared in
//! the catalog so a typo fails startup instead of silently denying.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use authz_gate_config::ResolverConfig;
use authz_gate_config::ResolverType;
use authz_gate_core::CachedMembershipResolver;
use authz_gate_core::InMemoryMembershipResolver;
use authz_gate_core::OrganizationId;
use authz_gate_core::PermissionCatalog;
use authz_gate_core::PrincipalId;
use authz_gate_core::RoleId;
use authz_gate_core::SharedMembershipResolver;
use authz_gate_core::WorkspaceId;
use authz_gate_store_sqlite::SqliteMembershipResolver;

use crate::server::ServerError;

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the membership resolver described by `config`.
///
/// # Errors
///
/// Returns [`ServerError`] when the backend cannot be opened or seeded.
pub fn build_resolver(
    config: &ResolverConfig,
    catalog: Arc<PermissionCatalog>,
) -> Result<SharedMembershipResolver, ServerError> {
    let cache = config.cache.map(|settings| settings.cache_config());
    match config.resolver_type {
        ResolverType::Memory => {
            let resolver = build_memory_resolver(config, catalog)?;
            Ok(match cache {
                Some(cache) => SharedMembershipResolver::from_resolver(
                    CachedMembershipResolver::new(resolver, cache),
                ),
                None => SharedMembershipResolver::from_resolver(resolver),
            })
        }
        ResolverType::Sqlite => {
            let store_config =
                config.sqlite_config().map_err(|err| ServerError::Config(err.to_string()))?;
            let store = SqliteMembershipResolver::open(&store_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            store.sync_catalog(&catalog).map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(match cache {
                Some(cache) => {
                    SharedMembershipResolver::from_resolver(CachedMembershipResolver::new(store, cache))
                }
                None => SharedMembershipResolver::from_resolver(store),
            })
        }
    }
}

/// Builds an in-memory resolver seeded from config fixtures.
fn build_memory_resolver(
    config: &ResolverConfig,
    catalog: Arc<PermissionCatalog>,
) -> Result<InMemoryMembershipResolver, ServerError> {
    config.validate_against(&catalog).map_err(|err| ServerError::Config(err.to_string()))?;
    let seeding = |err: authz_gate_core::ResolverError| ServerError::Init(err.to_string());

    let resolver = InMemoryMembershipResolver::new(Arc::clone(&catalog));
    for fixture in &config.workspaces {
        resolver
            .put_workspace(
                WorkspaceId::new(fixture.id.as_str()),
                OrganizationId::new(fixture.organization_id.as_str()),
            )
            .map_err(seeding)?;
    }
    for fixture in &config.organization_members {
        resolver
            .put_organization_member(
                PrincipalId::new(fixture.user_id.trim()),
                OrganizationId::new(fixture.organization_id.as_str()),
                RoleId::new(fixture.role.as_str()),
            )
            .map_err(seeding)?;
    }
    for fixture in &config.workspace_members {
        resolver
            .put_workspace_member(
                PrincipalId::new(fixture.user_id.trim()),
                WorkspaceId::new(fixture.workspace_id.as_str()),
                RoleId::new(fixture.role.as_str()),
            )
            .map_err(seeding)?;
    }
    Ok(resolver)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
