// crates/authz-gate-core/src/core/mod.rs
// ============================================================================
// Module: Authz Gate Core Types
// Description: Identifiers, permission grammar, catalog, and decision types.
// Purpose: Provide stable, serializable types shared by every Authz Gate crate.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types define the tenancy identifiers, the permission grammar, the
//! immutable permission catalog, and the decision request/verdict contract.
//! These types are the canonical source for the HTTP surface and stores.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod decision;
pub mod identifiers;
pub mod permission;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogDocument;
pub use catalog::CatalogError;
pub use catalog::CatalogRole;
pub use catalog::PermissionCatalog;
pub use catalog::PermissionDefinition;
pub use catalog::RoleDefinition;
pub use decision::DecisionReason;
pub use decision::DecisionRequest;
pub use decision::Verdict;
pub use identifiers::OrganizationId;
pub use identifiers::PrincipalId;
pub use identifiers::RoleId;
pub use identifiers::WorkspaceId;
pub use permission::Ownership;
pub use permission::Permission;
pub use permission::PermissionError;
pub use permission::PermissionScope;
