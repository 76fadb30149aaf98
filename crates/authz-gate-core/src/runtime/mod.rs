// crates/authz-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Authz Gate Runtime
// Description: Decision engine and membership resolver implementations.
// Purpose: Evaluate decisions against injected tenancy data.
// Dependencies: crate::core, crate::interfaces, tokio
// ============================================================================

//! ## Overview
//! Runtime components evaluate decision requests. The engine is generic over
//! a [`crate::interfaces::MembershipResolver`]; this module also ships an
//! in-memory resolver, a shared trait-object handle, and a TTL cache.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod engine;
pub mod memory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CacheConfig;
pub use cache::CachedMembershipResolver;
pub use engine::AuthorizationEngine;
pub use engine::DEFAULT_LOOKUP_TIMEOUT;
pub use engine::DEFAULT_ORG_ADMIN_PERMISSION;
pub use engine::DEFAULT_SUPER_ADMIN_ROLE;
pub use engine::EngineConfig;
pub use memory::InMemoryMembershipResolver;
pub use memory::SharedMembershipResolver;
