//! Roles and their permission rows, scoped to a facility.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::authz::Permission;
use crate::db::is_unique_violation;
use crate::db::row_parsers::parse_uuid;
use crate::errors::{AppError, AppResult};
use crate::models::role::{
    ensure_unique_pairs, validate_role_name, DbRole, DbRolePermission, PermissionInput, Role, RolePermission,
};
use crate::settings::RoleNamePolicy;
use crate::utils::utc_now;

const ROLE_COLUMNS: &str = "id, facility_id, name, created_at, updated_at";

#[derive(Clone)]
pub struct RoleStore {
    pool: SqlitePool,
    name_policy: RoleNamePolicy,
}

impl RoleStore {
    pub fn new(pool: SqlitePool, name_policy: RoleNamePolicy) -> Self {
        Self { pool, name_policy }
    }

    /// Persists a role together with its permissions in one transaction.
    pub async fn create_role(&self, facility_id: Uuid, raw_name: &str, permissions: &[Permission]) -> AppResult<Role> {
        let name = validate_role_name(raw_name)?;
        if permissions.is_empty() {
            return Err(AppError::validation("permissions: at least one permission is required"));
        }
        ensure_unique_pairs(permissions)?;

        let mut tx = self.pool.begin().await?;

        let facility_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM facilities WHERE id = ?)")
            .bind(facility_id.to_string())
            .fetch_one(&mut *tx)
            .await?;
        if !facility_exists {
            return Err(AppError::not_found("facility not found"));
        }

        self.check_name_available(&mut tx, facility_id, &name, None).await?;

        let role_id = Uuid::new_v4();
        let now = utc_now();
        sqlx::query("INSERT INTO roles (id, facility_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
            .bind(role_id.to_string())
            .bind(facility_id.to_string())
            .bind(&name)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        for permission in permissions {
            insert_permission(&mut tx, role_id, *permission).await?;
        }

        let role = fetch_role(&mut tx, role_id).await?;
        tx.commit().await?;

        tracing::info!(%role_id, %facility_id, name = %role.name, "role created");
        Ok(role)
    }

    /// Renames a role and applies a permission diff: listed ids are removed
    /// first, then entries without an id are inserted. Entries that already
    /// carry an id are left untouched.
    pub async fn update_role(
        &self,
        role_id: Uuid,
        raw_name: &str,
        new_permissions: &[PermissionInput],
        permissions_to_delete: &[i64],
    ) -> AppResult<Role> {
        let name = validate_role_name(raw_name)?;
        let staged: Vec<Permission> = new_permissions
            .iter()
            .filter(|p| p.id.is_none())
            .map(PermissionInput::permission)
            .collect();
        ensure_unique_pairs(&staged)?;

        let mut tx = self.pool.begin().await?;

        let current = fetch_role(&mut tx, role_id).await?;
        self.check_name_available(&mut tx, current.facility_id, &name, Some(role_id))
            .await?;

        sqlx::query("UPDATE roles SET name = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(utc_now())
            .bind(role_id.to_string())
            .execute(&mut *tx)
            .await?;

        for permission_id in permissions_to_delete {
            // scoped to this role so foreign ids are a no-op
            sqlx::query("DELETE FROM role_permissions WHERE id = ? AND role_id = ?")
                .bind(permission_id)
                .bind(role_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        for permission in &staged {
            insert_permission(&mut tx, role_id, *permission).await?;
        }

        let role = fetch_role(&mut tx, role_id).await?;
        if role.permissions.is_empty() {
            return Err(AppError::validation("permissions: a role must keep at least one permission"));
        }
        tx.commit().await?;

        tracing::info!(
            %role_id,
            added = staged.len(),
            removed = permissions_to_delete.len(),
            "role updated"
        );
        Ok(role)
    }

    /// Deletes a role. Permission rows cascade and memberships that
    /// referenced it are left without a role.
    pub async fn delete_role(&self, facility_id: Uuid, role_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ? AND facility_id = ?")
            .bind(role_id.to_string())
            .bind(facility_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("role not found"));
        }

        tracing::info!(%role_id, %facility_id, "role deleted");
        Ok(())
    }

    pub async fn get_all_roles(&self, facility_id: Uuid) -> AppResult<Vec<Role>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE facility_id = ? ORDER BY name, id");
        let rows = sqlx::query_as::<_, DbRole>(&sql)
            .bind(facility_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        let permission_rows = sqlx::query_as::<_, DbRolePermission>(
            r#"
            SELECT rp.id, rp.role_id, rp.section, rp.action
            FROM role_permissions rp
            JOIN roles r ON r.id = rp.role_id
            WHERE r.facility_id = ?
            ORDER BY rp.id
            "#,
        )
        .bind(facility_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut by_role: HashMap<String, Vec<RolePermission>> = HashMap::new();
        for row in permission_rows {
            let role_id = row.role_id.clone();
            by_role.entry(role_id).or_default().push(row.try_into()?);
        }

        rows.into_iter()
            .map(|row| {
                let permissions = by_role.remove(&row.id).unwrap_or_default();
                row.into_role(permissions)
            })
            .collect()
    }

    /// `None` when the role does not exist or belongs to another facility.
    pub async fn get_role_by_id(&self, facility_id: Uuid, role_id: Uuid) -> AppResult<Option<Role>> {
        let mut conn = self.pool.acquire().await?;
        match fetch_role(&mut conn, role_id).await {
            Ok(role) if role.facility_id == facility_id => Ok(Some(role)),
            Ok(_) | Err(AppError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Owning facility of a role, used to authorize updates that only carry
    /// the role id.
    pub async fn find_role_facility(&self, role_id: Uuid) -> AppResult<Option<Uuid>> {
        let facility_id: Option<String> = sqlx::query_scalar("SELECT facility_id FROM roles WHERE id = ?")
            .bind(role_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        facility_id.as_deref().map(parse_uuid).transpose()
    }

    pub async fn role_exists_in_facility(&self, facility_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        Ok(sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE id = ? AND facility_id = ?)")
            .bind(role_id.to_string())
            .bind(facility_id.to_string())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn check_name_available(
        &self,
        conn: &mut SqliteConnection,
        facility_id: Uuid,
        name: &str,
        except_role: Option<Uuid>,
    ) -> AppResult<()> {
        if self.name_policy == RoleNamePolicy::Allow {
            return Ok(());
        }

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM roles WHERE facility_id = ? AND name = ? AND id != ?)",
        )
        .bind(facility_id.to_string())
        .bind(name)
        .bind(except_role.map(|id| id.to_string()).unwrap_or_default())
        .fetch_one(&mut *conn)
        .await?;

        if taken {
            return Err(AppError::conflict(format!("a role named {name} already exists in this facility")));
        }
        Ok(())
    }
}

async fn insert_permission(conn: &mut SqliteConnection, role_id: Uuid, permission: Permission) -> AppResult<()> {
    sqlx::query("INSERT INTO role_permissions (role_id, section, action, created_at) VALUES (?, ?, ?, ?)")
        .bind(role_id.to_string())
        .bind(permission.section.as_str())
        .bind(permission.action.as_str())
        .bind(utc_now())
        .execute(&mut *conn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::validation(format!("permissions: {permission} is already granted"))
            } else {
                AppError::from(err)
            }
        })?;
    Ok(())
}

async fn fetch_role(conn: &mut SqliteConnection, role_id: Uuid) -> AppResult<Role> {
    let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?");
    let row = sqlx::query_as::<_, DbRole>(&sql)
        .bind(role_id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("role not found"))?;

    let permissions = sqlx::query_as::<_, DbRolePermission>(
        "SELECT id, role_id, section, action FROM role_permissions WHERE role_id = ? ORDER BY id",
    )
    .bind(role_id.to_string())
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(RolePermission::try_from)
    .collect::<AppResult<Vec<_>>>()?;

    row.into_role(permissions)
}
