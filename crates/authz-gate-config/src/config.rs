// crates/authz-gate-config/src/config.rs
// ============================================================================
// Module: Authz Gate Configuration
// Description: Configuration loading and validation for Authz Gate.
// Purpose: Provide strict, fail-closed config parsing with safe defaults.
// Dependencies: authz-gate-core, authz-gate-store-sqlite, serde, toml, uuid
// ============================================================================

//! ## Overview
//! This module loads `authz-gate.toml` and validates every section before the
//! server starts. Missing sections take conservative defaults: loopback bind,
//! local-only caller auth, the in-memory resolver, and the built-in catalog.
//! Security posture: config inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use authz_gate_core::CacheConfig;
use authz_gate_core::EngineConfig;
use authz_gate_core::Permission;
use authz_gate_core::PermissionCatalog;
use authz_gate_core::PermissionScope;
use authz_gate_core::RoleId;
use authz_gate_store_sqlite::SqliteStoreConfig;
use authz_gate_store_sqlite::SqliteStoreMode;
use authz_gate_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config file name.
const DEFAULT_CONFIG_NAME: &str = "authz-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "AUTHZ_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address for the decision endpoint.
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:10001";
/// Default maximum request body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Maximum allowed request body size in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Maximum number of internal secrets.
pub(crate) const MAX_INTERNAL_SECRETS: usize = 64;
/// Minimum length of an internal secret.
pub(crate) const MIN_INTERNAL_SECRET_LENGTH: usize = 16;
/// Maximum length of an internal secret.
pub(crate) const MAX_INTERNAL_SECRET_LENGTH: usize = 256;
/// Maximum length of the super-admin role marker.
pub(crate) const MAX_ROLE_MARKER_LENGTH: usize = 64;
/// Default per-lookup timeout in milliseconds.
pub(crate) const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2_000;
/// Minimum per-lookup timeout in milliseconds.
pub(crate) const MIN_LOOKUP_TIMEOUT_MS: u64 = 10;
/// Maximum per-lookup timeout in milliseconds.
pub(crate) const MAX_LOOKUP_TIMEOUT_MS: u64 = 30_000;
/// Default overall decision deadline in milliseconds.
pub(crate) const DEFAULT_DECISION_DEADLINE_MS: u64 = 5_000;
/// Maximum overall decision deadline in milliseconds.
pub(crate) const MAX_DECISION_DEADLINE_MS: u64 = 60_000;
/// Maximum cache TTL in milliseconds.
pub(crate) const MAX_CACHE_TTL_MS: u64 = 3_600_000;
/// Maximum cache entries per table.
pub(crate) const MAX_CACHE_ENTRIES: usize = 1_000_000;
/// Maximum number of fixture rows per table.
pub(crate) const MAX_FIXTURE_ROWS: usize = 10_000;
/// Maximum length of a principal identifier.
pub(crate) const MAX_PRINCIPAL_ID_LENGTH: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Authz Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthzGateConfig {
    /// Decision endpoint configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Decision engine configuration.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Permission catalog source.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Membership resolver backend.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl AuthzGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from the argument, then `AUTHZ_GATE_CONFIG`, then
    /// `./authz-gate.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        let content = read_limited_utf8(&resolved)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.engine.validate()?;
        self.catalog.validate()?;
        self.resolver.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Decision endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Overall per-request decision deadline in milliseconds.
    #[serde(default = "default_decision_deadline_ms")]
    pub decision_deadline_ms: u64,
    /// Caller authentication.
    #[serde(default)]
    pub auth: ServerAuthConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            decision_deadline_ms: default_decision_deadline_ms(),
            auth: ServerAuthConfig::default(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Returns the overall decision deadline.
    #[must_use]
    pub const fn decision_deadline(&self) -> Duration {
        Duration::from_millis(self.decision_deadline_ms)
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let addr = self.bind_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between 1 and {MAX_MAX_BODY_BYTES}"
            )));
        }
        if self.decision_deadline_ms == 0 || self.decision_deadline_ms > MAX_DECISION_DEADLINE_MS {
            return Err(ConfigError::Invalid(format!(
                "server.decision_deadline_ms must be between 1 and {MAX_DECISION_DEADLINE_MS}"
            )));
        }
        self.auth.validate()?;
        self.audit.validate()?;
        if !addr.ip().is_loopback() && self.auth.mode == ServerAuthMode::LocalOnly {
            return Err(ConfigError::Invalid(
                "non-loopback bind requires server.auth.mode = \"internal_secret\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Caller authentication modes for the decision endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuthMode {
    /// Loopback callers only.
    #[default]
    LocalOnly,
    /// Shared secret in the `X-Internal-Secret` header.
    InternalSecret,
}

/// Caller authentication configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuthConfig {
    /// Authentication mode.
    #[serde(default)]
    pub mode: ServerAuthMode,
    /// Accepted internal secrets (rotation allows more than one).
    #[serde(default)]
    pub internal_secrets: Vec<String>,
}

impl ServerAuthConfig {
    /// Validates auth configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.internal_secrets.len() > MAX_INTERNAL_SECRETS {
            return Err(ConfigError::Invalid("too many internal secrets".to_string()));
        }
        for secret in &self.internal_secrets {
            let length = secret.len();
            if !(MIN_INTERNAL_SECRET_LENGTH ..= MAX_INTERNAL_SECRET_LENGTH).contains(&length) {
                return Err(ConfigError::Invalid(format!(
                    "internal secrets must be {MIN_INTERNAL_SECRET_LENGTH}..={MAX_INTERNAL_SECRET_LENGTH} bytes"
                )));
            }
            if secret.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
                return Err(ConfigError::Invalid(
                    "internal secrets must not contain whitespace".to_string(),
                ));
            }
        }
        match self.mode {
            ServerAuthMode::LocalOnly if !self.internal_secrets.is_empty() => {
                Err(ConfigError::Invalid(
                    "internal_secrets require server.auth.mode = \"internal_secret\"".to_string(),
                ))
            }
            ServerAuthMode::InternalSecret if self.internal_secrets.is_empty() => {
                Err(ConfigError::Invalid(
                    "internal_secret auth requires at least one secret".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Decision engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    /// Global role claim that bypasses all checks.
    #[serde(default = "default_super_admin_role")]
    pub super_admin_role: String,
    /// Organization permission that overrides workspace membership.
    #[serde(default = "default_org_admin_permission")]
    pub org_admin_permission: String,
    /// Per-lookup timeout in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            super_admin_role: default_super_admin_role(),
            org_admin_permission: default_org_admin_permission(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl EngineSettings {
    /// Builds the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the settings are invalid.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let org_admin_permission = Permission::parse(&self.org_admin_permission).map_err(|err| {
            ConfigError::Invalid(format!("engine.org_admin_permission: {err}"))
        })?;
        if org_admin_permission.scope() != PermissionScope::Organization {
            return Err(ConfigError::Invalid(
                "engine.org_admin_permission must be an org: permission".to_string(),
            ));
        }
        Ok(EngineConfig::new(
            self.super_admin_role.clone(),
            org_admin_permission,
            Duration::from_millis(self.lookup_timeout_ms),
        ))
    }

    /// Validates engine settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let role = self.super_admin_role.trim();
        if role.is_empty() || role.len() > MAX_ROLE_MARKER_LENGTH || role != self.super_admin_role {
            return Err(ConfigError::Invalid(format!(
                "engine.super_admin_role must be 1..={MAX_ROLE_MARKER_LENGTH} bytes without \
                 surrounding whitespace"
            )));
        }
        if !(MIN_LOOKUP_TIMEOUT_MS ..= MAX_LOOKUP_TIMEOUT_MS).contains(&self.lookup_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "engine.lookup_timeout_ms must be between {MIN_LOOKUP_TIMEOUT_MS} and \
                 {MAX_LOOKUP_TIMEOUT_MS}"
            )));
        }
        self.engine_config().map(|_| ())
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Permission catalog source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Catalog TOML file; the built-in catalog is used when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl CatalogConfig {
    /// Validates catalog configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("catalog.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Membership resolver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolverType {
    /// In-memory tables seeded from config fixtures.
    #[default]
    Memory,
    /// `SQLite` membership tables.
    Sqlite,
}

/// Membership resolver configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Backend type.
    #[serde(rename = "type", default)]
    pub resolver_type: ResolverType,
    /// `SQLite` database path (sqlite only).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Optional TTL cache in front of the backend.
    #[serde(default)]
    pub cache: Option<CacheSettings>,
    /// Workspace fixtures (memory only).
    #[serde(default)]
    pub workspaces: Vec<WorkspaceFixture>,
    /// Organization membership fixtures (memory only).
    #[serde(default)]
    pub organization_members: Vec<OrganizationMemberFixture>,
    /// Workspace membership fixtures (memory only).
    #[serde(default)]
    pub workspace_members: Vec<WorkspaceMemberFixture>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolver_type: ResolverType::Memory,
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            cache: None,
            workspaces: Vec::new(),
            organization_members: Vec::new(),
            workspace_members: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// Returns the `SQLite` store config for sqlite resolvers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the resolver is not sqlite or lacks a path.
    pub fn sqlite_config(&self) -> Result<SqliteStoreConfig, ConfigError> {
        if self.resolver_type != ResolverType::Sqlite {
            return Err(ConfigError::Invalid("resolver.type is not sqlite".to_string()));
        }
        let path = self
            .path
            .clone()
            .ok_or_else(|| ConfigError::Invalid("sqlite resolver requires path".to_string()))?;
        Ok(SqliteStoreConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        })
    }

    /// Returns true when any membership fixtures are configured.
    #[must_use]
    pub fn has_fixtures(&self) -> bool {
        !self.workspaces.is_empty()
            || !self.organization_members.is_empty()
            || !self.workspace_members.is_empty()
    }

    /// Checks that every fixture role is declared in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first undeclared role.
    pub fn validate_against(&self, catalog: &PermissionCatalog) -> Result<(), ConfigError> {
        let roles = self
            .organization_members
            .iter()
            .map(|fixture| fixture.role.as_str())
            .chain(self.workspace_members.iter().map(|fixture| fixture.role.as_str()));
        for role in roles {
            if catalog.role(&RoleId::new(role)).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "fixture role {role} is not declared in the catalog"
                )));
            }
        }
        Ok(())
    }

    /// Validates resolver configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cache) = &self.cache {
            cache.validate()?;
        }
        match self.resolver_type {
            ResolverType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite resolver requires path".to_string())
                })?;
                validate_path_string("resolver.path", &path.to_string_lossy())?;
                if self.has_fixtures() {
                    return Err(ConfigError::Invalid(
                        "membership fixtures are only supported by the memory resolver"
                            .to_string(),
                    ));
                }
                Ok(())
            }
            ResolverType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory resolver must not set path".to_string(),
                    ));
                }
                self.validate_fixtures()
            }
        }
    }

    /// Validates fixture ids, role namespaces, and per-pair uniqueness.
    fn validate_fixtures(&self) -> Result<(), ConfigError> {
        let rows =
            self.workspaces.len().max(self.organization_members.len()).max(self.workspace_members.len());
        if rows > MAX_FIXTURE_ROWS {
            return Err(ConfigError::Invalid("too many resolver fixtures".to_string()));
        }

        let mut workspaces = BTreeMap::new();
        for fixture in &self.workspaces {
            let id = validate_uuid("resolver.workspaces.id", &fixture.id)?;
            let organization_id =
                validate_uuid("resolver.workspaces.organization_id", &fixture.organization_id)?;
            if workspaces.insert(id, organization_id).is_some() {
                return Err(ConfigError::Invalid(format!("duplicate workspace {}", fixture.id)));
            }
        }

        let mut organization_pairs = BTreeSet::new();
        for fixture in &self.organization_members {
            let user_id = validate_principal(&fixture.user_id)?;
            let organization_id = validate_uuid(
                "resolver.organization_members.organization_id",
                &fixture.organization_id,
            )?;
            validate_role(&fixture.role, PermissionScope::Organization)?;
            if !organization_pairs.insert((user_id, organization_id)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate organization membership for {} in {}",
                    fixture.user_id, fixture.organization_id
                )));
            }
        }

        let mut workspace_pairs = BTreeSet::new();
        for fixture in &self.workspace_members {
            let user_id = validate_principal(&fixture.user_id)?;
            validate_role(&fixture.role, PermissionScope::Workspace)?;
            let workspace_id =
                validate_uuid("resolver.workspace_members.workspace_id", &fixture.workspace_id)?;
            if !workspaces.contains_key(&workspace_id) {
                return Err(ConfigError::Invalid(format!(
                    "workspace membership references unknown workspace {}",
                    fixture.workspace_id
                )));
            }
            if !workspace_pairs.insert((user_id, workspace_id)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate workspace membership for {} in {}",
                    fixture.user_id, fixture.workspace_id
                )));
            }
        }
        Ok(())
    }
}

/// Cache settings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Time an answer stays cached, in milliseconds.
    pub ttl_ms: u64,
    /// Maximum entries per lookup table.
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl CacheSettings {
    /// Converts settings into a cache configuration.
    #[must_use]
    pub const fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_millis(self.ttl_ms),
            max_entries: self.max_entries,
        }
    }

    /// Validates cache settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_ms == 0 || self.ttl_ms > MAX_CACHE_TTL_MS {
            return Err(ConfigError::Invalid(format!(
                "resolver.cache.ttl_ms must be between 1 and {MAX_CACHE_TTL_MS}"
            )));
        }
        if self.max_entries == 0 || self.max_entries > MAX_CACHE_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "resolver.cache.max_entries must be between 1 and {MAX_CACHE_ENTRIES}"
            )));
        }
        Ok(())
    }
}

/// Workspace fixture row.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceFixture {
    /// Workspace UUID.
    pub id: String,
    /// Owning organization UUID.
    pub organization_id: String,
}

/// Organization membership fixture row.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizationMemberFixture {
    /// Principal identifier.
    pub user_id: String,
    /// Organization UUID.
    pub organization_id: String,
    /// `org:` role identifier.
    pub role: String,
}

/// Workspace membership fixture row.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceMemberFixture {
    /// Principal identifier.
    pub user_id: String,
    /// Workspace UUID.
    pub workspace_id: String,
    /// `workspace:` role identifier.
    pub role: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, env var, or default name.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Reads a size-limited UTF-8 file.
pub(crate) fn read_limited_utf8(path: &Path) -> Result<String, ConfigError> {
    validate_path(path)?;
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    String::from_utf8(bytes)
        .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} component too long")));
        }
    }
    Ok(())
}

/// Validates that a fixture id is a UUID.
fn validate_uuid(field: &str, value: &str) -> Result<String, ConfigError> {
    uuid::Uuid::parse_str(value)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| ConfigError::Invalid(format!("{field} must be a uuid: {value}")))
}

/// Validates a fixture principal id.
fn validate_principal(value: &str) -> Result<&str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_PRINCIPAL_ID_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "fixture user_id must be 1..={MAX_PRINCIPAL_ID_LENGTH} bytes"
        )));
    }
    Ok(trimmed)
}

/// Validates a fixture role id and its namespace.
fn validate_role(value: &str, expected: PermissionScope) -> Result<(), ConfigError> {
    match RoleId::new(value).scope() {
        Some(scope) if scope == expected => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "fixture role {value} must be a {}:<name> role",
            expected.prefix()
        ))),
    }
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default overall decision deadline.
const fn default_decision_deadline_ms() -> u64 {
    DEFAULT_DECISION_DEADLINE_MS
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default super-admin role marker.
fn default_super_admin_role() -> String {
    authz_gate_core::runtime::DEFAULT_SUPER_ADMIN_ROLE.to_string()
}

/// Default org-admin override permission.
fn default_org_admin_permission() -> String {
    authz_gate_core::runtime::DEFAULT_ORG_ADMIN_PERMISSION.to_string()
}

/// Default per-lookup timeout.
const fn default_lookup_timeout_ms() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_MS
}

/// Default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Default cache entry limit.
const fn default_cache_max_entries() -> usize {
    authz_gate_core::runtime::cache::DEFAULT_CACHE_MAX_ENTRIES
}
