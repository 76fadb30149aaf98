// crates/authz-gate-core/src/runtime/cache.rs
// ============================================================================
// Module: Cached Membership Resolver
// Description: TTL-bounded caching decorator over a membership resolver.
// Purpose: Cut backend round-trips for repeated lookups with explicit expiry.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`CachedMembershipResolver`] wraps another [`MembershipResolver`] and
//! caches successful answers, including "not found", for a fixed TTL. Errors
//! are never cached. The cache is an owned component, so staleness is bounded
//! by the configured TTL or ended early with the `invalidate_*` methods.
//! When full, expired entries are pruned; if none expired the new answer is
//! simply not stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;

use crate::core::OrganizationId;
use crate::core::Permission;
use crate::core::PrincipalId;
use crate::core::RoleId;
use crate::core::WorkspaceId;
use crate::interfaces::MembershipResolver;
use crate::interfaces::ResolverError;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Default cache TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
/// Default per-table entry limit.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Cache sizing and expiry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time an answer stays valid.
    pub ttl: Duration,
    /// Maximum entries per lookup table.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

// ============================================================================
// SECTION: TTL Table
// ============================================================================

/// Cached answer with its expiry instant.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// Cached value.
    value: V,
    /// Instant after which the value is stale.
    expires_at: Instant,
}

/// Bounded map whose entries expire after a TTL.
#[derive(Debug)]
struct TtlTable<K, V> {
    /// Entries protected by a mutex.
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates an empty table.
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a live entry; poisoned locks read as a miss.
    fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Stores an answer, pruning expired entries when full.
    fn insert(&self, key: K, value: V, config: CacheConfig) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        let now = Instant::now();
        if entries.len() >= config.max_entries {
            entries.retain(|_, entry| entry.expires_at > now);
            if entries.len() >= config.max_entries {
                return;
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + config.ttl,
            },
        );
    }

    /// Drops entries matching a predicate.
    fn remove_where(&self, predicate: impl Fn(&K) -> bool) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|key, _| !predicate(key));
        }
    }

    /// Drops every entry.
    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

// ============================================================================
// SECTION: Cached Resolver
// ============================================================================

/// Caching decorator over a membership resolver.
pub struct CachedMembershipResolver<R> {
    /// Wrapped resolver.
    inner: R,
    /// Cache settings.
    config: CacheConfig,
    /// Organization membership answers.
    organization_members: TtlTable<(PrincipalId, OrganizationId), Option<RoleId>>,
    /// Workspace membership answers.
    workspace_members: TtlTable<(PrincipalId, WorkspaceId), Option<RoleId>>,
    /// Role permission answers.
    role_permissions: TtlTable<(RoleId, Permission), bool>,
    /// Workspace ownership answers.
    workspace_organizations: TtlTable<WorkspaceId, Option<OrganizationId>>,
}

impl<R> CachedMembershipResolver<R> {
    /// Wraps a resolver with the given cache settings.
    #[must_use]
    pub fn new(inner: R, config: CacheConfig) -> Self {
        Self {
            inner,
            config,
            organization_members: TtlTable::new(),
            workspace_members: TtlTable::new(),
            role_permissions: TtlTable::new(),
            workspace_organizations: TtlTable::new(),
        }
    }

    /// Returns the cache settings.
    #[must_use]
    pub const fn config(&self) -> CacheConfig {
        self.config
    }

    /// Returns the wrapped resolver.
    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.inner
    }

    /// Drops every cached answer.
    pub fn invalidate_all(&self) {
        self.organization_members.clear();
        self.workspace_members.clear();
        self.role_permissions.clear();
        self.workspace_organizations.clear();
    }

    /// Drops cached memberships for one principal.
    pub fn invalidate_principal(&self, principal_id: &PrincipalId) {
        self.organization_members.remove_where(|(principal, _)| principal == principal_id);
        self.workspace_members.remove_where(|(principal, _)| principal == principal_id);
    }

    /// Drops the cached owning organization for one workspace.
    pub fn invalidate_workspace(&self, workspace_id: &WorkspaceId) {
        self.workspace_organizations.remove_where(|workspace| workspace == workspace_id);
        self.workspace_members.remove_where(|(_, workspace)| workspace == workspace_id);
    }
}

#[async_trait]
impl<R> MembershipResolver for CachedMembershipResolver<R>
where
    R: MembershipResolver,
{
    async fn find_organization_membership(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let key = (principal_id.clone(), organization_id.clone());
        if let Some(cached) = self.organization_members.get(&key) {
            return Ok(cached);
        }
        let answer = self.inner.find_organization_membership(principal_id, organization_id).await?;
        self.organization_members.insert(key, answer.clone(), self.config);
        Ok(answer)
    }

    async fn find_workspace_membership(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let key = (principal_id.clone(), workspace_id.clone());
        if let Some(cached) = self.workspace_members.get(&key) {
            return Ok(cached);
        }
        let answer = self.inner.find_workspace_membership(principal_id, workspace_id).await?;
        self.workspace_members.insert(key, answer.clone(), self.config);
        Ok(answer)
    }

    async fn has_role_permission(
        &self,
        role_id: &RoleId,
        permission: &Permission,
    ) -> Result<bool, ResolverError> {
        let key = (role_id.clone(), permission.clone());
        if let Some(cached) = self.role_permissions.get(&key) {
            return Ok(cached);
        }
        let answer = self.inner.has_role_permission(role_id, permission).await?;
        self.role_permissions.insert(key, answer, self.config);
        Ok(answer)
    }

    async fn find_workspace_organization(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<OrganizationId>, ResolverError> {
        if let Some(cached) = self.workspace_organizations.get(workspace_id) {
            return Ok(cached);
        }
        let answer = self.inner.find_workspace_organization(workspace_id).await?;
        self.workspace_organizations.insert(workspace_id.clone(), answer.clone(), self.config);
        Ok(answer)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::CacheConfig;
    use super::CachedMembershipResolver;
    use crate::core::OrganizationId;
    use crate::core::Permission;
    use crate::core::PrincipalId;
    use crate::core::RoleId;
    use crate::core::WorkspaceId;
    use crate::interfaces::MembershipResolver;
    use crate::interfaces::ResolverError;

    /// Resolver that counts workspace lookups and can be told to fail.
    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl MembershipResolver for CountingResolver {
        async fn find_organization_membership(
            &self,
            _principal_id: &PrincipalId,
            _organization_id: &OrganizationId,
        ) -> Result<Option<RoleId>, ResolverError> {
            Ok(None)
        }

        async fn find_workspace_membership(
            &self,
            _principal_id: &PrincipalId,
            _workspace_id: &WorkspaceId,
        ) -> Result<Option<RoleId>, ResolverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ResolverError::Unavailable("down".to_string()));
            }
            Ok(Some(RoleId::new("workspace:member")))
        }

        async fn has_role_permission(
            &self,
            _role_id: &RoleId,
            _permission: &Permission,
        ) -> Result<bool, ResolverError> {
            Ok(false)
        }

        async fn find_workspace_organization(
            &self,
            _workspace_id: &WorkspaceId,
        ) -> Result<Option<OrganizationId>, ResolverError> {
            Ok(None)
        }
    }

    fn cached(ttl: Duration) -> CachedMembershipResolver<CountingResolver> {
        CachedMembershipResolver::new(
            CountingResolver::default(),
            CacheConfig {
                ttl,
                max_entries: 16,
            },
        )
    }

    #[tokio::test]
    async fn repeated_lookup_hits_cache() {
        let resolver = cached(Duration::from_secs(60));
        let principal = PrincipalId::new("u1");
        let workspace = WorkspaceId::new("w1");
        for _ in 0 .. 3 {
            let role = resolver.find_workspace_membership(&principal, &workspace).await.unwrap();
            assert_eq!(role, Some(RoleId::new("workspace:member")));
        }
        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let resolver = cached(Duration::from_millis(10));
        let principal = PrincipalId::new("u1");
        let workspace = WorkspaceId::new("w1");
        resolver.find_workspace_membership(&principal, &workspace).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        resolver.find_workspace_membership(&principal, &workspace).await.unwrap();
        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let resolver = cached(Duration::from_secs(60));
        let principal = PrincipalId::new("u1");
        let workspace = WorkspaceId::new("w1");
        resolver.inner().fail.store(true, Ordering::SeqCst);
        assert!(resolver.find_workspace_membership(&principal, &workspace).await.is_err());
        resolver.inner().fail.store(false, Ordering::SeqCst);
        assert!(resolver.find_workspace_membership(&principal, &workspace).await.is_ok());
        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_forces_refetch() {
        let resolver = cached(Duration::from_secs(60));
        let principal = PrincipalId::new("u1");
        let workspace = WorkspaceId::new("w1");
        resolver.find_workspace_membership(&principal, &workspace).await.unwrap();
        resolver.invalidate_principal(&principal);
        resolver.find_workspace_membership(&principal, &workspace).await.unwrap();
        resolver.invalidate_all();
        resolver.find_workspace_membership(&principal, &workspace).await.unwrap();
        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 3);
    }
}
