// crates/authz-gate-core/src/core/catalog.rs
// ============================================================================
// Module: Permission Catalog
// Description: Immutable role-to-permission table validated at start-up.
// Purpose: Answer role permission lookups without I/O at decision time.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The permission catalog is bootstrap data: a set of declared permissions
//! and a set of namespaced roles, each granting a subset of the declared
//! permissions. [`PermissionCatalog::from_document`] validates the whole
//! document and fails closed on any violation. Once built the catalog never
//! changes; roles without an entry simply grant nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::RoleId;
use crate::core::permission::Permission;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of declared permissions.
pub const MAX_CATALOG_PERMISSIONS: usize = 4096;
/// Maximum number of declared roles.
pub const MAX_CATALOG_ROLES: usize = 1024;
/// Maximum permissions granted by a single role.
pub const MAX_ROLE_PERMISSIONS: usize = 1024;
/// Maximum length of role names and permission descriptions.
pub const MAX_CATALOG_TEXT_LENGTH: usize = 512;

// ============================================================================
// SECTION: Document Types
// ============================================================================

/// Declared permission entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionDefinition {
    /// Permission identifier.
    pub id: Permission,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// Declared role entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDefinition {
    /// Namespaced role identifier.
    pub id: RoleId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Permissions granted by the role.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Unvalidated catalog document as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    /// Declared permissions.
    #[serde(default)]
    pub permissions: Vec<PermissionDefinition>,
    /// Declared roles.
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Validated role entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRole {
    /// Display name.
    name: String,
    /// Granted permissions.
    permissions: BTreeSet<Permission>,
}

impl CatalogRole {
    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the granted permissions.
    #[must_use]
    pub const fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }
}

/// Immutable, validated Role → set(Permission) table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    /// Declared permissions with descriptions.
    permissions: BTreeMap<Permission, String>,
    /// Declared roles.
    roles: BTreeMap<RoleId, CatalogRole>,
}

impl PermissionCatalog {
    /// Validates a catalog document and builds the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the document violates catalog rules.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        if document.permissions.len() > MAX_CATALOG_PERMISSIONS {
            return Err(CatalogError::TooLarge(format!(
                "catalog declares {} permissions (max {MAX_CATALOG_PERMISSIONS})",
                document.permissions.len()
            )));
        }
        if document.roles.len() > MAX_CATALOG_ROLES {
            return Err(CatalogError::TooLarge(format!(
                "catalog declares {} roles (max {MAX_CATALOG_ROLES})",
                document.roles.len()
            )));
        }

        let mut permissions = BTreeMap::new();
        for definition in document.permissions {
            validate_text("permission description", &definition.description)?;
            if permissions.contains_key(&definition.id) {
                return Err(CatalogError::DuplicatePermission(definition.id.to_string()));
            }
            permissions.insert(definition.id, definition.description);
        }

        let mut roles = BTreeMap::new();
        for definition in document.roles {
            if definition.id.scope().is_none() {
                return Err(CatalogError::InvalidRole(definition.id.to_string()));
            }
            if roles.contains_key(&definition.id) {
                return Err(CatalogError::DuplicateRole(definition.id.to_string()));
            }
            validate_text("role name", &definition.name)?;
            if definition.permissions.len() > MAX_ROLE_PERMISSIONS {
                return Err(CatalogError::TooLarge(format!(
                    "role {} grants too many permissions",
                    definition.id
                )));
            }
            let mut granted = BTreeSet::new();
            for permission in definition.permissions {
                if !permissions.contains_key(&permission) {
                    return Err(CatalogError::UndeclaredPermission {
                        role: definition.id.to_string(),
                        permission: permission.to_string(),
                    });
                }
                if !granted.insert(permission.clone()) {
                    return Err(CatalogError::DuplicateGrant {
                        role: definition.id.to_string(),
                        permission: permission.to_string(),
                    });
                }
            }
            roles.insert(
                definition.id,
                CatalogRole {
                    name: definition.name,
                    permissions: granted,
                },
            );
        }

        Ok(Self {
            permissions,
            roles,
        })
    }

    /// Returns true when the role grants the permission.
    ///
    /// Unknown roles grant nothing.
    #[must_use]
    pub fn has_role_permission(&self, role_id: &RoleId, permission: &Permission) -> bool {
        self.roles.get(role_id).is_some_and(|role| role.permissions.contains(permission))
    }

    /// Returns a declared role.
    #[must_use]
    pub fn role(&self, role_id: &RoleId) -> Option<&CatalogRole> {
        self.roles.get(role_id)
    }

    /// Iterates declared roles in id order.
    pub fn roles(&self) -> impl Iterator<Item = (&RoleId, &CatalogRole)> {
        self.roles.iter()
    }

    /// Iterates declared permissions with descriptions in id order.
    pub fn permissions(&self) -> impl Iterator<Item = (&Permission, &str)> {
        self.permissions.iter().map(|(permission, description)| (permission, description.as_str()))
    }

    /// Returns true when the permission is declared.
    #[must_use]
    pub fn declares(&self, permission: &Permission) -> bool {
        self.permissions.contains_key(permission)
    }

    /// Returns the number of declared roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Returns the number of declared permissions.
    #[must_use]
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Role id is not `org:<name>` or `workspace:<name>`.
    #[error("invalid role id: {0}")]
    InvalidRole(String),
    /// Role declared twice.
    #[error("duplicate role id: {0}")]
    DuplicateRole(String),
    /// Permission declared twice.
    #[error("duplicate permission id: {0}")]
    DuplicatePermission(String),
    /// Role references a permission that is not declared.
    #[error("role {role} references undeclared permission {permission}")]
    UndeclaredPermission {
        /// Role identifier.
        role: String,
        /// Permission identifier.
        permission: String,
    },
    /// Role lists the same permission twice.
    #[error("role {role} grants {permission} more than once")]
    DuplicateGrant {
        /// Role identifier.
        role: String,
        /// Permission identifier.
        permission: String,
    },
    /// Catalog exceeded a size limit.
    #[error("catalog too large: {0}")]
    TooLarge(String),
    /// Text field exceeded its limit.
    #[error("catalog invalid text: {0}")]
    InvalidText(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates free-text catalog fields.
fn validate_text(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.len() > MAX_CATALOG_TEXT_LENGTH {
        return Err(CatalogError::InvalidText(format!("{field} exceeds max length")));
    }
    Ok(())
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

    use super::CatalogDocument;
    use super::CatalogError;
    use super::PermissionCatalog;
    use super::PermissionDefinition;
    use super::RoleDefinition;
    use crate::core::identifiers::RoleId;
    use crate::core::permission::Permission;

    fn permission(id: &str) -> Permission {
        Permission::parse(id).unwrap()
    }

    fn declared(ids: &[&str]) -> Vec<PermissionDefinition> {
        ids.iter()
            .map(|id| PermissionDefinition {
                id: permission(id),
                description: String::new(),
            })
            .collect()
    }

    fn role(id: &str, permissions: &[&str]) -> RoleDefinition {
        RoleDefinition {
            id: RoleId::new(id),
            name: id.to_string(),
            permissions: permissions.iter().map(|id| permission(id)).collect(),
        }
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let catalog = PermissionCatalog::from_document(CatalogDocument {
            permissions: declared(&["workspace:task:read"]),
            roles: vec![role("workspace:viewer", &["workspace:task:read"])],
        })
        .unwrap();
        let read = permission("workspace:task:read");
        assert!(catalog.has_role_permission(&RoleId::new("workspace:viewer"), &read));
        assert!(!catalog.has_role_permission(&RoleId::new("workspace:ghost"), &read));
    }

    #[test]
    fn rejects_duplicate_roles() {
        let result = PermissionCatalog::from_document(CatalogDocument {
            permissions: declared(&["org:users"]),
            roles: vec![role("org:admin", &["org:users"]), role("org:admin", &[])],
        });
        assert_eq!(result, Err(CatalogError::DuplicateRole("org:admin".to_string())));
    }

    #[test]
    fn rejects_unnamespaced_roles() {
        let result = PermissionCatalog::from_document(CatalogDocument {
            permissions: Vec::new(),
            roles: vec![role("admin", &[])],
        });
        assert_eq!(result, Err(CatalogError::InvalidRole("admin".to_string())));
    }

    #[test]
    fn rejects_undeclared_grants() {
        let result = PermissionCatalog::from_document(CatalogDocument {
            permissions: declared(&["org:users"]),
            roles: vec![role("org:admin", &["org:manage"])],
        });
        assert!(matches!(result, Err(CatalogError::UndeclaredPermission { .. })));
    }

    #[test]
    fn rejects_duplicate_permissions_and_grants() {
        let result = PermissionCatalog::from_document(CatalogDocument {
            permissions: declared(&["org:users", "org:users"]),
            roles: Vec::new(),
        });
        assert!(matches!(result, Err(CatalogError::DuplicatePermission(_))));

        let result = PermissionCatalog::from_document(CatalogDocument {
            permissions: declared(&["org:users"]),
            roles: vec![role("org:admin", &["org:users", "org:users"])],
        });
        assert!(matches!(result, Err(CatalogError::DuplicateGrant { .. })));
    }
}
