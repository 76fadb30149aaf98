// crates/authz-gate-core/src/core/permission.rs
// ============================================================================
// Module: Permission Grammar
// Description: Parsed permission identifiers with scope and ownership tags.
// Purpose: Parse permission strings once so the engine matches on types.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A permission identifier follows the grammar
//! `("org" | "workspace") ":" segment (":" segment)* [":" ("own" | "all")]`.
//! Parsing happens once at the boundary and produces a [`Permission`] carrying
//! its [`PermissionScope`] and optional [`Ownership`] suffix. The scope prefix
//! alone decides which resolution path a decision takes.
//!
//! The ownership suffix is only recognized after at least one other segment,
//! so `workspace:own` is a plain single-segment permission.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum permission identifier length in bytes.
pub const MAX_PERMISSION_LENGTH: usize = 256;
/// Maximum number of segments after the scope prefix.
pub const MAX_PERMISSION_SEGMENTS: usize = 8;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resolution scope fixed by a permission's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// `org:` permissions resolved against organization membership.
    Organization,
    /// `workspace:` permissions resolved against workspace membership.
    Workspace,
}

impl PermissionScope {
    /// Maps a namespace prefix to a scope.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "org" => Some(Self::Organization),
            "workspace" => Some(Self::Workspace),
            _ => None,
        }
    }

    /// Returns the namespace prefix for the scope.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Organization => "org",
            Self::Workspace => "workspace",
        }
    }
}

/// Ownership qualifier on a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ownership {
    /// Only resources the principal owns.
    Own,
    /// Any resource in scope. Implies [`Ownership::Own`].
    All,
}

impl Ownership {
    /// Parses an ownership suffix segment.
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "own" => Some(Self::Own),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Parsed, well-formed permission identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    /// Canonical identifier text.
    raw: String,
    /// Scope from the prefix.
    scope: PermissionScope,
    /// Ownership suffix, when present.
    ownership: Option<Ownership>,
}

impl Permission {
    /// Parses a permission identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] when the identifier does not match the
    /// permission grammar.
    pub fn parse(value: &str) -> Result<Self, PermissionError> {
        if value.is_empty() {
            return Err(PermissionError::Empty);
        }
        if value.len() > MAX_PERMISSION_LENGTH {
            return Err(PermissionError::TooLong {
                max_bytes: MAX_PERMISSION_LENGTH,
                actual_bytes: value.len(),
            });
        }
        let (prefix, rest) =
            value.split_once(':').ok_or_else(|| PermissionError::MissingScope(value.to_string()))?;
        let scope = PermissionScope::from_prefix(prefix)
            .ok_or_else(|| PermissionError::UnknownScope(prefix.to_string()))?;
        let segments: Vec<&str> = rest.split(':').collect();
        if segments.len() > MAX_PERMISSION_SEGMENTS {
            return Err(PermissionError::TooManySegments(value.to_string()));
        }
        for segment in &segments {
            if !is_valid_segment(segment) {
                return Err(PermissionError::InvalidSegment(value.to_string()));
            }
        }
        let ownership = match segments.as_slice() {
            [_, .., last] => Ownership::from_segment(last),
            _ => None,
        };
        Ok(Self {
            raw: value.to_string(),
            scope,
            ownership,
        })
    }

    /// Builds a permission from parts already known to satisfy the grammar.
    pub(crate) fn from_trusted_parts(
        raw: &str,
        scope: PermissionScope,
        ownership: Option<Ownership>,
    ) -> Self {
        Self {
            raw: raw.to_string(),
            scope,
            ownership,
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the resolution scope.
    #[must_use]
    pub const fn scope(&self) -> PermissionScope {
        self.scope
    }

    /// Returns the ownership suffix, if any.
    #[must_use]
    pub const fn ownership(&self) -> Option<Ownership> {
        self.ownership
    }

    /// Returns the `:all` permission that implies this one.
    ///
    /// Only `:own` permissions have an unrestricted equivalent; `:all` does
    /// not imply anything wider and unqualified permissions imply nothing.
    #[must_use]
    pub fn unrestricted_equivalent(&self) -> Option<Self> {
        if self.ownership != Some(Ownership::Own) {
            return None;
        }
        let stem = self.raw.strip_suffix(":own")?;
        Some(Self::from_trusted_parts(&format!("{stem}:all"), self.scope, Some(Ownership::All)))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.raw
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Permission grammar violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// Identifier was empty.
    #[error("permission must be non-empty")]
    Empty,
    /// Identifier exceeded the length limit.
    #[error("permission exceeds length limit: {actual_bytes} bytes (max {max_bytes})")]
    TooLong {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual identifier size in bytes.
        actual_bytes: usize,
    },
    /// Identifier had no `scope:` prefix.
    #[error("permission missing scope prefix: {0}")]
    MissingScope(String),
    /// Prefix was neither `org` nor `workspace`.
    #[error("permission scope must be org or workspace: {0}")]
    UnknownScope(String),
    /// A segment was empty or contained invalid characters.
    #[error("permission contains an invalid segment: {0}")]
    InvalidSegment(String),
    /// Too many segments.
    #[error("permission has too many segments: {0}")]
    TooManySegments(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when a segment is non-empty and uses `[A-Za-z0-9_-]`.
fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-')
}

// ============================================================================
// SECTION: Tests
// ============================================================================
