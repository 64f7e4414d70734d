use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::row_parsers::{parse_opt_uuid, parse_uuid};
use crate::errors::AppError;
use crate::events::{Loggable, Severity};
use crate::extract::Validate;
use crate::models::identity::UserType;
use crate::utils::is_valid_email;

pub const MAX_EMPLOYEE_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbProfile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbProfile> for Profile {
    type Error = AppError;

    fn try_from(value: DbProfile) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: parse_uuid(&value.id)?,
            name: value.name,
            email: value.email,
            img: value.img,
            created_at: value.created_at,
        })
    }
}

/// Facility membership row: who works where and under which role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub facility_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Option<Uuid>,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMembership {
    pub facility_id: String,
    pub user_id: String,
    pub role_id: Option<String>,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

impl TryFrom<DbMembership> for Membership {
    type Error = AppError;

    fn try_from(value: DbMembership) -> Result<Self, Self::Error> {
        Ok(Membership {
            facility_id: parse_uuid(&value.facility_id)?,
            user_id: parse_uuid(&value.user_id)?,
            role_id: parse_opt_uuid(value.role_id.as_deref())?,
            is_admin: value.is_admin,
            joined_at: value.joined_at,
        })
    }
}

/// Employee listing entry: membership, profile and the resolved role name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub facility_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Option<Uuid>,
    pub role_name: Option<String>,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
    pub profile: Profile,
}

impl Loggable for Employee {
    fn entity_type() -> &'static str { "employee" }
    fn subject_id(&self) -> Uuid { self.user_id }
    fn facility_id(&self) -> Option<Uuid> { Some(self.facility_id) }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbEmployee {
    pub facility_id: String,
    pub user_id: String,
    pub role_id: Option<String>,
    pub role_name: Option<String>,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
    pub name: String,
    pub email: Option<String>,
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbEmployee> for Employee {
    type Error = AppError;

    fn try_from(value: DbEmployee) -> Result<Self, Self::Error> {
        let user_id = parse_uuid(&value.user_id)?;
        Ok(Employee {
            facility_id: parse_uuid(&value.facility_id)?,
            user_id,
            role_id: parse_opt_uuid(value.role_id.as_deref())?,
            role_name: value.role_name,
            is_admin: value.is_admin,
            joined_at: value.joined_at,
            profile: Profile {
                id: user_id,
                name: value.name,
                email: value.email,
                img: value.img,
                created_at: value.created_at,
            },
        })
    }
}

/// Lifecycle of an employee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    PendingInvite,
    Active,
    Removed,
}

/// Returned by employee provisioning.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRef {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub status: EmployeeStatus,
}

impl Loggable for EmployeeRef {
    fn entity_type() -> &'static str { "employee" }
    fn subject_id(&self) -> Uuid { self.user_id }
    fn facility_id(&self) -> Option<Uuid> { Some(self.facility_id) }
    fn severity(&self) -> Severity { Severity::Critical }
}

// =============================================================================
// REQUESTS
// =============================================================================

fn validate_employee_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name: Name is required"));
    }
    if name.chars().count() > MAX_EMPLOYEE_NAME_LEN {
        return Err(AppError::validation("name: Name too long"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[schema(example = "coach@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    pub role_id: Uuid,
    pub facility_id: Uuid,
    pub user_type: UserType,
}

impl Validate for CreateEmployeeRequest {
    fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(&self.email) {
            return Err(AppError::validation("email: Invalid email format"));
        }
        validate_employee_name(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEmployeeRequest {
    pub user_id: Uuid,
    pub facility_id: Uuid,
}

impl Validate for DeleteEmployeeRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub name: String,
    /// `null` leaves the employee without a role.
    pub role_id: Option<Uuid>,
}

impl Validate for UpdateEmployeeRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_employee_name(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, name: &str) -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            email: email.into(),
            name: name.into(),
            role_id: Uuid::new_v4(),
            facility_id: Uuid::new_v4(),
            user_type: UserType::User,
        }
    }

    #[test]
    fn create_request_checks_email_and_name() {
        assert!(request("coach@example.com", "Coach").validate().is_ok());
        assert!(request("not-an-email", "Coach").validate().is_err());
        assert!(request("coach@example.com", " ").validate().is_err());
        assert!(request("coach@example.com", &"n".repeat(101)).validate().is_err());
    }

    #[test]
    fn request_shape_uses_camel_case() {
        let json = serde_json::json!({
            "email": "a@b.co",
            "name": "A",
            "roleId": Uuid::new_v4(),
            "facilityId": Uuid::new_v4(),
            "userType": "admin"
        });
        let req: CreateEmployeeRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.user_type, UserType::Admin);
    }
}
