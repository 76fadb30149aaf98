// crates/authz-gate-config/src/catalog.rs
// ============================================================================
// Module: Catalog Loading
// Description: Built-in and file-backed permission catalogs.
// Purpose: Turn catalog TOML into a validated permission catalog.
// Dependencies: authz-gate-core, toml
// ============================================================================

//! ## Overview
//! The built-in catalog is embedded with `include_str!`; no runtime I/O is
//! needed when `[catalog].path` is unset. File catalogs go through the same
//! size and UTF-8 limits as the main config file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use authz_gate_core::CatalogDocument;
use authz_gate_core::PermissionCatalog;

use crate::config::AuthzGateConfig;
use crate::config::ConfigError;
use crate::config::read_limited_utf8;

// ============================================================================
// SECTION: Built-In Catalog
// ============================================================================

/// Built-in catalog TOML.
pub const DEFAULT_CATALOG_TOML: &str = include_str!("../catalog/default.toml");

/// Returns the built-in permission catalog.
///
/// # Errors
///
/// Returns [`ConfigError`] when the embedded catalog fails validation.
pub fn default_catalog() -> Result<PermissionCatalog, ConfigError> {
    parse_catalog(DEFAULT_CATALOG_TOML)
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Parses and validates catalog TOML text.
///
/// # Errors
///
/// Returns [`ConfigError`] when the text is not a valid catalog.
pub fn parse_catalog(content: &str) -> Result<PermissionCatalog, ConfigError> {
    let document: CatalogDocument =
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
    PermissionCatalog::from_document(document)
        .map_err(|err| ConfigError::Invalid(format!("catalog: {err}")))
}

/// Loads and validates a catalog file.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read or is invalid.
pub fn load_catalog(path: &Path) -> Result<PermissionCatalog, ConfigError> {
    let content = read_limited_utf8(path)?;
    parse_catalog(&content)
}

impl AuthzGateConfig {
    /// Loads the catalog named by `[catalog].path`, or the built-in catalog,
    /// and checks the resolver fixtures against it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the catalog cannot be loaded or a fixture
    /// role is not declared in it.
    pub fn load_catalog(&self) -> Result<PermissionCatalog, ConfigError> {
        let catalog = match &self.catalog.path {
            Some(path) => load_catalog(Path::new(path.trim()))?,
            None => default_catalog()?,
        };
        self.resolver.validate_against(&catalog)?;
        Ok(catalog)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
