// crates/authz-gate-config/src/lib.rs
// ============================================================================
// Module: Authz Gate Config Library
// Description: Canonical configuration model for Authz Gate.
// Purpose: Load, validate, and expose `authz-gate.toml` and permission catalogs.
// Dependencies: authz-gate-core, authz-gate-store-sqlite, serde, toml, uuid
// ============================================================================

//! ## Overview
//! This crate owns the configuration file format shared by the server and
//! CLI. Loading is strict: unknown keys, oversized files, and inconsistent
//! sections are rejected before any listener starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::DEFAULT_CATALOG_TOML;
pub use catalog::default_catalog;
pub use catalog::load_catalog;
pub use catalog::parse_catalog;
pub use config::AuthzGateConfig;
pub use config::CONFIG_ENV_VAR;
pub use config::CacheSettings;
pub use config::CatalogConfig;
pub use config::ConfigError;
pub use config::EngineSettings;
pub use config::OrganizationMemberFixture;
pub use config::ResolverConfig;
pub use config::ResolverType;
pub use config::ServerAuditConfig;
pub use config::ServerAuthConfig;
pub use config::ServerAuthMode;
pub use config::ServerConfig;
pub use config::WorkspaceFixture;
pub use config::WorkspaceMemberFixture;
