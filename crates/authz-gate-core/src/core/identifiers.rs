// crates/authz-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Authz Gate Identifiers
// Description: Opaque identifiers for principals, tenants, and roles.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! This module defines the string-based identifiers used throughout Authz
//! Gate. Identifiers are opaque and serialize as strings. Organization and
//! workspace ids that parse as UUIDs (hyphenated, simple, braced, or urn, in
//! any case) are stored in lowercase hyphenated form, so every constructor
//! path yields the same key for the same tenant. Rejecting non-UUID scope ids
//! happens at the transport boundary, and role id namespacing is enforced
//! when the permission catalog is loaded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::permission::PermissionScope;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Principal (user) identifier supplied by an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Creates a new principal identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Organization (top-level tenant) identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct OrganizationId(String);

impl OrganizationId {
    /// Creates a new organization identifier, canonicalizing UUID-shaped input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(canonical_scope_id(id.into()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for OrganizationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OrganizationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<OrganizationId> for String {
    fn from(value: OrganizationId) -> Self {
        value.0
    }
}

/// Workspace (sub-tenant) identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WorkspaceId(String);

impl WorkspaceId {
    /// Creates a new workspace identifier, canonicalizing UUID-shaped input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(canonical_scope_id(id.into()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for WorkspaceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WorkspaceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<WorkspaceId> for String {
    fn from(value: WorkspaceId) -> Self {
        value.0
    }
}

/// Role identifier such as `org:owner` or `workspace:viewer`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a new role identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the scope encoded in the role namespace, if the id is well-formed.
    ///
    /// A well-formed role id is `org:<name>` or `workspace:<name>` where the
    /// name is a single non-empty segment of `[A-Za-z0-9_-]`.
    #[must_use]
    pub fn scope(&self) -> Option<PermissionScope> {
        let (prefix, name) = self.0.split_once(':')?;
        let scope = PermissionScope::from_prefix(prefix)?;
        let valid_name = !name.is_empty()
            && name.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-');
        valid_name.then_some(scope)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RoleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoleId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rewrites a UUID scope id into lowercase hyphenated form; other ids pass through.
fn canonical_scope_id(id: String) -> String {
    match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid.hyphenated().to_string(),
        Err(_) => id,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
