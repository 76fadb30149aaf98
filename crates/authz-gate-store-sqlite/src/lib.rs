// crates/authz-gate-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Membership Store
// Description: Durable MembershipResolver backend using SQLite WAL.
// Purpose: Persist memberships and a mirrored permission catalog.
// Dependencies: authz-gate-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`MembershipResolver`] that stores
//! workspaces, organization and workspace memberships, and a mirror of the
//! permission catalog. Primary keys keep memberships unique per
//! (principal, scope) pair. Security posture: storage inputs are untrusted.
//!
//! [`MembershipResolver`]: authz_gate_core::MembershipResolver

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteMembershipResolver;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
