use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Permission, PermissionAction, PermissionSection};
use crate::db::row_parsers::{parse_action, parse_section, parse_uuid};
use crate::errors::AppError;
use crate::events::{Loggable, Severity};
use crate::extract::Validate;

pub const MAX_ROLE_NAME_LEN: usize = 50;

// =============================================================================
// ROLE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub facility_id: Uuid,
    #[schema(example = "FRONT_DESK")]
    pub name: String,
    pub permissions: Vec<RolePermission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn grants(&self, section: PermissionSection, action: PermissionAction) -> bool {
        self.permissions
            .iter()
            .any(|p| p.section == section && p.action == action)
    }

    pub fn permission_set(&self) -> impl Iterator<Item = Permission> + '_ {
        self.permissions.iter().map(RolePermission::permission)
    }
}

impl Loggable for Role {
    fn entity_type() -> &'static str { "role" }
    fn subject_id(&self) -> Uuid { self.id }
    fn facility_id(&self) -> Option<Uuid> { Some(self.facility_id) }
    fn severity(&self) -> Severity { Severity::Critical }
}

/// A persisted permission row. The id marks it as already saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RolePermission {
    pub id: i64,
    pub section: PermissionSection,
    pub action: PermissionAction,
}

impl RolePermission {
    pub fn permission(&self) -> Permission {
        Permission::new(self.section, self.action)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRole {
    pub id: String,
    pub facility_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRolePermission {
    pub id: i64,
    pub role_id: String,
    pub section: String,
    pub action: String,
}

impl TryFrom<DbRolePermission> for RolePermission {
    type Error = AppError;

    fn try_from(value: DbRolePermission) -> Result<Self, Self::Error> {
        Ok(RolePermission {
            id: value.id,
            section: parse_section(&value.section)?,
            action: parse_action(&value.action)?,
        })
    }
}

impl DbRole {
    pub fn into_role(self, permissions: Vec<RolePermission>) -> Result<Role, AppError> {
        Ok(Role {
            id: parse_uuid(&self.id)?,
            facility_id: parse_uuid(&self.facility_id)?,
            name: self.name,
            permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// =============================================================================
// NAME NORMALIZATION
// =============================================================================

/// Upper-snake-case form used for persisted role names:
/// `"  admin   user!!"` becomes `"ADMIN_USER"`.
pub fn normalize_role_name(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Checks the raw name and returns its normalized form.
pub fn validate_role_name(raw: &str) -> Result<String, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::validation("roleName: must not be empty"));
    }
    if raw.chars().count() > MAX_ROLE_NAME_LEN {
        return Err(AppError::validation(format!(
            "roleName: must be at most {MAX_ROLE_NAME_LEN} characters"
        )));
    }

    let normalized = normalize_role_name(raw);
    if normalized.is_empty() {
        return Err(AppError::validation("roleName: must contain letters or digits"));
    }
    Ok(normalized)
}

/// Rejects a permission list that repeats a `(section, action)` pair.
pub fn ensure_unique_pairs<'a>(permissions: impl IntoIterator<Item = &'a Permission>) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    for permission in permissions {
        if !seen.insert(*permission) {
            return Err(AppError::validation(format!("permissions: duplicate entry {permission}")));
        }
    }
    Ok(())
}

// =============================================================================
// REQUESTS
// =============================================================================

/// A permission as sent by an editing client. `id` is present only for rows
/// that were already saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionInput {
    pub action: PermissionAction,
    pub section: PermissionSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl PermissionInput {
    pub fn permission(&self) -> Permission {
        Permission::new(self.section, self.action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    #[schema(example = "front desk")]
    pub role_name: String,
    pub permissions: Vec<PermissionInput>,
    pub facility_id: Uuid,
}

impl Validate for CreateRoleRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_role_name(&self.role_name)?;
        if self.permissions.is_empty() {
            return Err(AppError::validation("permissions: at least one permission is required"));
        }
        let pairs: Vec<Permission> = self.permissions.iter().map(PermissionInput::permission).collect();
        ensure_unique_pairs(&pairs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub role_id: Uuid,
    #[schema(example = "front desk")]
    pub new_role_name: String,
    #[serde(default)]
    pub new_permissions: Vec<PermissionInput>,
    #[serde(default)]
    pub permissions_to_delete: Vec<i64>,
}

impl Validate for UpdateRoleRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_role_name(&self.new_role_name)?;
        let staged: Vec<Permission> = self
            .new_permissions
            .iter()
            .filter(|p| p.id.is_none())
            .map(PermissionInput::permission)
            .collect();
        ensure_unique_pairs(&staged)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoleRequest {
    pub role_id: Uuid,
    pub facility_id: Uuid,
}

impl Validate for DeleteRoleRequest {}
