//! SQLite-backed role store
//!
//! Features:
//! - WAL mode for better concurrency
//! - Partial unique indexes so uniqueness among active roles is enforced at
//!   write time, not only by the caller's pre-check
//! - Soft delete and override cleanup in a single transaction

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rolesync_core::{
    CoreError, DeployGroupRole, NewDeployGroupRole, NewRole, ProjectId, Role, RoleId,
};

use crate::RoleStore;
use crate::error::{RegistryError, Result, UniqueField};

const ROLE_COLUMNS: &str =
    "id, project_id, config_file, name, resource_name, service_name, created_at, deleted_at";

/// How long a writer waits for another process's lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DEPLOY_GROUP_ROLE_COLUMNS: &str =
    "id, project_id, kubernetes_role_id, deploy_group_id, cpu, ram, replicas";

/// SQLite implementation of [`RoleStore`]
pub struct SqliteRoleStore {
    conn: Connection,
}

impl SqliteRoleStore {
    /// Open or create the registry at the default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(&path)
    }

    /// Open or create the registry at a specific path
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        tracing::debug!("Opened role registry at {}", path.display());

        let mut store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory registry (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Get default registry path
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| RegistryError::storage("Could not determine data directory"))?;
        Ok(data_dir.join("rolesync").join("roles.db"))
    }

    /// Initialize database schema
    fn init(&mut self) -> Result<()> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kubernetes_roles (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                config_file TEXT NOT NULL,
                name TEXT NOT NULL,
                resource_name TEXT NOT NULL,
                service_name TEXT,
                created_at INTEGER NOT NULL,
                deleted_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS kubernetes_deploy_group_roles (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                kubernetes_role_id INTEGER NOT NULL REFERENCES kubernetes_roles(id),
                deploy_group_id INTEGER NOT NULL,
                cpu REAL NOT NULL,
                ram INTEGER NOT NULL,
                replicas INTEGER NOT NULL,
                UNIQUE(kubernetes_role_id, deploy_group_id)
            );

            -- Uniqueness only applies to roles that are not soft-deleted
            CREATE UNIQUE INDEX IF NOT EXISTS idx_roles_resource_name
                ON kubernetes_roles(resource_name) WHERE deleted_at IS NULL;
            CREATE UNIQUE INDEX IF NOT EXISTS idx_roles_service_name
                ON kubernetes_roles(service_name)
                WHERE deleted_at IS NULL AND service_name IS NOT NULL;

            CREATE INDEX IF NOT EXISTS idx_roles_project ON kubernetes_roles(project_id);
            CREATE INDEX IF NOT EXISTS idx_dgr_role ON kubernetes_deploy_group_roles(kubernetes_role_id);
            "#,
        )?;

        Ok(())
    }

    fn query_roles(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Role>> {
        let mut stmt = self.conn.prepare(sql)?;
        let roles = stmt
            .query_map(params, role_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(roles)
    }
}

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get(0)?,
        project_id: row.get(1)?,
        config_file: row.get(2)?,
        name: row.get(3)?,
        resource_name: row.get(4)?,
        service_name: row.get(5)?,
        created_at: from_millis(row.get(6)?),
        deleted_at: row.get::<_, Option<i64>>(7)?.map(from_millis),
    })
}

fn deploy_group_role_from_row(row: &Row<'_>) -> rusqlite::Result<DeployGroupRole> {
    Ok(DeployGroupRole {
        id: row.get(0)?,
        project_id: row.get(1)?,
        kubernetes_role_id: row.get(2)?,
        deploy_group_id: row.get(3)?,
        cpu: row.get(4)?,
        ram: row.get::<_, i64>(5)?.max(0) as u64,
        replicas: row.get::<_, i64>(6)?.max(0) as u32,
    })
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Translate a unique index violation into a conflict on the offending field
fn insert_error(err: rusqlite::Error, field_values: &[(UniqueField, Option<&str>)]) -> RegistryError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            for (field, value) in field_values {
                let column = match field {
                    UniqueField::ResourceName => "resource_name",
                    UniqueField::ServiceName => "service_name",
                    UniqueField::DeployGroup => "deploy_group_id",
                };
                if message.contains(column) {
                    return RegistryError::Conflict {
                        field: *field,
                        value: value.unwrap_or_default().to_string(),
                    };
                }
            }
        }
    }
    err.into()
}

impl RoleStore for SqliteRoleStore {
    fn active_roles_for_project(&self, project_id: ProjectId) -> Result<Vec<Role>> {
        self.query_roles(
            &format!(
                "SELECT {} FROM kubernetes_roles WHERE project_id = ?1 AND deleted_at IS NULL ORDER BY id",
                ROLE_COLUMNS
            ),
            [project_id],
        )
    }

    fn find_role(&self, id: RoleId) -> Result<Option<Role>> {
        let role = self
            .conn
            .query_row(
                &format!("SELECT {} FROM kubernetes_roles WHERE id = ?1", ROLE_COLUMNS),
                [id],
                role_from_row,
            )
            .optional()?;
        Ok(role)
    }

    fn all_roles(&self) -> Result<Vec<Role>> {
        self.query_roles(
            &format!("SELECT {} FROM kubernetes_roles ORDER BY id", ROLE_COLUMNS),
            [],
        )
    }

    fn resource_name_in_use(&self, resource_name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM kubernetes_roles WHERE resource_name = ?1 AND deleted_at IS NULL",
            [resource_name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn service_name_in_use(&self, service_name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM kubernetes_roles WHERE service_name = ?1 AND deleted_at IS NULL",
            [service_name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_roles(&mut self, roles: &[NewRole]) -> Result<Vec<Role>> {
        for role in roles {
            role.validate()?;
        }

        let now = Utc::now();
        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(roles.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO kubernetes_roles (project_id, config_file, name, resource_name, service_name, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for role in roles {
                stmt.execute(params![
                    role.project_id,
                    role.config_file,
                    role.name,
                    role.resource_name,
                    role.service_name,
                    now.timestamp_millis(),
                ])
                .map_err(|e| {
                    insert_error(
                        e,
                        &[
                            (UniqueField::ResourceName, Some(role.resource_name.as_str())),
                            (UniqueField::ServiceName, role.service_name.as_deref()),
                        ],
                    )
                })?;

                created.push(Role {
                    id: tx.last_insert_rowid(),
                    project_id: role.project_id,
                    config_file: role.config_file.clone(),
                    name: role.name.clone(),
                    resource_name: role.resource_name.clone(),
                    service_name: role.service_name.clone(),
                    created_at: from_millis(now.timestamp_millis()),
                    deleted_at: None,
                });
            }
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(created)
    }

    fn soft_delete_role(&mut self, id: RoleId) -> Result<Role> {
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE kubernetes_roles SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![Utc::now().timestamp_millis(), id],
        )?;
        if updated == 0 {
            return Err(RegistryError::RoleNotFound { id });
        }

        let removed = tx.execute(
            "DELETE FROM kubernetes_deploy_group_roles WHERE kubernetes_role_id = ?1",
            [id],
        )?;
        tx.commit()?;

        tracing::debug!("Soft-deleted role {} and {} deploy group role(s)", id, removed);

        self.find_role(id)?
            .ok_or(RegistryError::RoleNotFound { id })
    }

    fn create_deploy_group_role(&mut self, dgr: &NewDeployGroupRole) -> Result<DeployGroupRole> {
        dgr.validate()?;

        let tx = self.conn.transaction()?;

        let owner: Option<ProjectId> = tx
            .query_row(
                "SELECT project_id FROM kubernetes_roles WHERE id = ?1 AND deleted_at IS NULL",
                [dgr.kubernetes_role_id],
                |r| r.get(0),
            )
            .optional()?;
        let owner = owner.ok_or(RegistryError::RoleNotFound {
            id: dgr.kubernetes_role_id,
        })?;
        if owner != dgr.project_id {
            return Err(CoreError::InvalidDeployGroupRole {
                message: format!(
                    "role {} belongs to project {}, not {}",
                    dgr.kubernetes_role_id, owner, dgr.project_id
                ),
            }
            .into());
        }

        let deploy_group = dgr.deploy_group_id.to_string();
        tx.execute(
            r#"
            INSERT INTO kubernetes_deploy_group_roles (project_id, kubernetes_role_id, deploy_group_id, cpu, ram, replicas)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                dgr.project_id,
                dgr.kubernetes_role_id,
                dgr.deploy_group_id,
                dgr.cpu,
                dgr.ram as i64,
                dgr.replicas as i64,
            ],
        )
        .map_err(|e| insert_error(e, &[(UniqueField::DeployGroup, Some(deploy_group.as_str()))]))?;

        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(DeployGroupRole {
            id,
            project_id: dgr.project_id,
            kubernetes_role_id: dgr.kubernetes_role_id,
            deploy_group_id: dgr.deploy_group_id,
            cpu: dgr.cpu,
            ram: dgr.ram,
            replicas: dgr.replicas,
        })
    }

    fn deploy_group_roles_for_role(&self, role_id: RoleId) -> Result<Vec<DeployGroupRole>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM kubernetes_deploy_group_roles WHERE kubernetes_role_id = ?1 ORDER BY id",
            DEPLOY_GROUP_ROLE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([role_id], deploy_group_role_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
