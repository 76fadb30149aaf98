// crates/authz-gate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Membership Resolver
// Description: Durable MembershipResolver backed by SQLite WAL.
// Purpose: Answer tenancy lookups from persistent membership tables.
// Dependencies: authz-gate-core, rusqlite, serde, thiserror, tokio
// ============================================================================

//! ## Overview
//! This module implements [`MembershipResolver`] on top of `SQLite`. The
//! schema holds workspaces, organization and workspace memberships, and a
//! copy of the permission catalog kept in sync by
//! [`SqliteMembershipResolver::sync_catalog`]. Reads run on the blocking
//! thread pool. Write helpers preserve per-(principal, scope) uniqueness and
//! refuse to move a workspace to a different organization. Scope ids arrive
//! as [`OrganizationId`] / [`WorkspaceId`] values, which already hold the
//! canonical UUID form, so rows written here match request lookups.

// ============================================================================//
// SECTION: Imports
// ============================================================================//

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use authz_gate_core::MembershipResolver;
use authz_gate_core::OrganizationId;
use authz_gate_core::Permission;
use authz_gate_core::PermissionCatalog;
use authz_gate_core::PrincipalId;
use authz_gate_core::ResolverError;
use authz_gate_core::RoleId;
use authz_gate_core::WorkspaceId;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================//
// SECTION: Constants
// ============================================================================//

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================//
// SECTION: Config
// ============================================================================//

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` membership store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config with default pragmas for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================//
// SECTION: Errors
// ============================================================================//

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or rejected write.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for ResolverError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => {
                Self::Unavailable(message)
            }
            SqliteStoreError::VersionMismatch(message) | SqliteStoreError::Invalid(message) => {
                Self::Invalid(message)
            }
        }
    }
}

// ============================================================================//
// SECTION: Store
// ============================================================================//

/// `SQLite`-backed membership resolver.
#[derive(Clone)]
pub struct SqliteMembershipResolver {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteMembershipResolver {
    /// Opens an `SQLite`-backed membership store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Replaces the stored roles and permissions with the catalog contents.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the transaction fails.
    pub fn sync_catalog(&self, catalog: &PermissionCatalog) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute_batch(
            "DELETE FROM role_permissions; DELETE FROM roles; DELETE FROM permissions;",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        for (permission, description) in catalog.permissions() {
            tx.execute(
                "INSERT INTO permissions (id, description) VALUES (?1, ?2)",
                params![permission.as_str(), description],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        for (role_id, role) in catalog.roles() {
            tx.execute(
                "INSERT INTO roles (id, name) VALUES (?1, ?2)",
                params![role_id.as_str(), role.name()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            for permission in role.permissions() {
                tx.execute(
                    "INSERT INTO role_permissions (role_id, permission_id) VALUES (?1, ?2)",
                    params![role_id.as_str(), permission.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
        }
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(())
    }

    /// Records a workspace under its owning organization.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the workspace already
    /// belongs to a different organization.
    pub fn put_workspace(
        &self,
        workspace_id: &WorkspaceId,
        organization_id: &OrganizationId,
    ) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT organization_id FROM workspaces WHERE id = ?1",
                params![workspace_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        match existing {
            Some(existing) if existing != organization_id.as_str() => {
                return Err(SqliteStoreError::Invalid(format!(
                    "workspace {workspace_id} already belongs to organization {existing}"
                )));
            }
            Some(_) => {}
            None => {
                tx.execute(
                    "INSERT INTO workspaces (id, organization_id) VALUES (?1, ?2)",
                    params![workspace_id.as_str(), organization_id.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
        }
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(())
    }

    /// Assigns or replaces a principal's organization role.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn put_organization_member(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
        role_id: &RoleId,
    ) -> Result<(), SqliteStoreError> {
        self.lock()?
            .execute(
                "INSERT INTO organization_members (user_id, organization_id, role_id)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, organization_id) DO UPDATE SET role_id = excluded.role_id",
                params![principal_id.as_str(), organization_id.as_str(), role_id.as_str()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Assigns or replaces a principal's workspace role.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the workspace is unknown,
    /// or [`SqliteStoreError::Db`] when the write fails.
    pub fn put_workspace_member(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
        role_id: &RoleId,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        let known: Option<i64> = guard
            .query_row(
                "SELECT 1 FROM workspaces WHERE id = ?1",
                params![workspace_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if known.is_none() {
            return Err(SqliteStoreError::Invalid(format!("unknown workspace {workspace_id}")));
        }
        guard
            .execute(
                "INSERT INTO workspace_members (user_id, workspace_id, role_id)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, workspace_id) DO UPDATE SET role_id = excluded.role_id",
                params![principal_id.as_str(), workspace_id.as_str(), role_id.as_str()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(())
    }

    /// Removes a principal's organization membership; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn remove_organization_member(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
    ) -> Result<bool, SqliteStoreError> {
        let removed = self
            .lock()?
            .execute(
                "DELETE FROM organization_members WHERE user_id = ?1 AND organization_id = ?2",
                params![principal_id.as_str(), organization_id.as_str()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(removed > 0)
    }

    /// Removes a principal's workspace membership; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn remove_workspace_member(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
    ) -> Result<bool, SqliteStoreError> {
        let removed = self
            .lock()?
            .execute(
                "DELETE FROM workspace_members WHERE user_id = ?1 AND workspace_id = ?2",
                params![principal_id.as_str(), workspace_id.as_str()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(removed > 0)
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Runs a single-value query returning an optional text column.
    fn query_text(
        &self,
        sql: &str,
        first: &str,
        second: Option<&str>,
    ) -> Result<Option<String>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = match second {
            Some(second) => {
                guard.query_row(sql, params![first, second], |row| row.get::<_, String>(0))
            }
            None => guard.query_row(sql, params![first], |row| row.get::<_, String>(0)),
        }
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(row)
    }

    /// Runs a blocking store read on the blocking thread pool.
    async fn read<T, F>(&self, read: F) -> Result<T, ResolverError>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T, SqliteStoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || read(&store))
            .await
            .map_err(|err| ResolverError::Unavailable(format!("sqlite read task failed: {err}")))?
            .map_err(ResolverError::from)
    }
}

#[async_trait]
impl MembershipResolver for SqliteMembershipResolver {
    async fn find_organization_membership(
        &self,
        principal_id: &PrincipalId,
        organization_id: &OrganizationId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let principal_id = principal_id.clone();
        let organization_id = organization_id.clone();
        self.read(move |store| {
            store
                .query_text(
                    "SELECT role_id FROM organization_members
                     WHERE user_id = ?1 AND organization_id = ?2",
                    principal_id.as_str(),
                    Some(organization_id.as_str()),
                )
                .map(|role| role.map(RoleId::new))
        })
        .await
    }

    async fn find_workspace_membership(
        &self,
        principal_id: &PrincipalId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<RoleId>, ResolverError> {
        let principal_id = principal_id.clone();
        let workspace_id = workspace_id.clone();
        self.read(move |store| {
            store
                .query_text(
                    "SELECT role_id FROM workspace_members WHERE user_id = ?1 AND workspace_id = ?2",
                    principal_id.as_str(),
                    Some(workspace_id.as_str()),
                )
                .map(|role| role.map(RoleId::new))
        })
        .await
    }

    async fn has_role_permission(
        &self,
        role_id: &RoleId,
        permission: &Permission,
    ) -> Result<bool, ResolverError> {
        let role_id = role_id.clone();
        let permission = permission.clone();
        self.read(move |store| {
            store
                .query_text(
                    "SELECT role_id FROM role_permissions WHERE role_id = ?1 AND permission_id = ?2",
                    role_id.as_str(),
                    Some(permission.as_str()),
                )
                .map(|row| row.is_some())
        })
        .await
    }

    async fn find_workspace_organization(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<OrganizationId>, ResolverError> {
        let workspace_id = workspace_id.clone();
        self.read(move |store| {
            store
                .query_text(
                    "SELECT organization_id FROM workspaces WHERE id = ?1",
                    workspace_id.as_str(),
                    None,
                )
                .map(|organization| organization.map(OrganizationId::new))
        })
        .await
    }
}

// ============================================================================//
// SECTION: Helpers
// ============================================================================//

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS permissions (
                    id TEXT PRIMARY KEY,
                    description TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS roles (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS role_permissions (
                    role_id TEXT NOT NULL,
                    permission_id TEXT NOT NULL,
                    PRIMARY KEY (role_id, permission_id),
                    FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE,
                    FOREIGN KEY (permission_id) REFERENCES permissions(id) ON DELETE CASCADE
                );
                CREATE TABLE IF NOT EXISTS workspaces (
                    id TEXT PRIMARY KEY,
                    organization_id TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS organization_members (
                    user_id TEXT NOT NULL,
                    organization_id TEXT NOT NULL,
                    role_id TEXT NOT NULL,
                    PRIMARY KEY (user_id, organization_id)
                );
                CREATE TABLE IF NOT EXISTS workspace_members (
                    user_id TEXT NOT NULL,
                    workspace_id TEXT NOT NULL,
                    role_id TEXT NOT NULL,
                    PRIMARY KEY (user_id, workspace_id),
                    FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_workspaces_organization_id
                    ON workspaces (organization_id);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
