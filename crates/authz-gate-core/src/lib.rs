// crates/authz-gate-core/src/lib.rs
// ============================================================================
// Module: Authz Gate Core Library
// Description: Public API surface for the Authz Gate decision core.
// Purpose: Expose core types, the resolver interface, and the engine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Authz Gate core answers one question: may this principal exercise this
//! permission in this organization or workspace? It encodes a two-level
//! tenancy hierarchy, an organization administrator override, a super-admin
//! bypass, and the rule that `:all` implies `:own`. Decisions are pure and
//! fail closed; tenancy data arrives through an injected resolver.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::MembershipResolver;
pub use interfaces::ResolverError;
pub use runtime::AuthorizationEngine;
pub use runtime::CacheConfig;
pub use runtime::CachedMembershipResolver;
pub use runtime::EngineConfig;
pub use runtime::InMemoryMembershipResolver;
pub use runtime::SharedMembershipResolver;
