use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::row_parsers::parse_uuid;
use crate::errors::AppError;
use crate::events::{Loggable, Severity};
use crate::extract::Validate;
use crate::models::employee::Profile;

/// Coarse, top-level claim carried on the identity account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    SuperAdmin,
    Admin,
    #[default]
    User,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::SuperAdmin => "super_admin",
            UserType::Admin => "admin",
            UserType::User => "user",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "super_admin" => Ok(UserType::SuperAdmin),
            "admin" => Ok(UserType::Admin),
            "user" => Ok(UserType::User),
            other => Err(AppError::internal(format!("invalid user type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    PendingInvite,
    Active,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::PendingInvite => "pending_invite",
            IdentityStatus::Active => "active",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "pending_invite" => Ok(IdentityStatus::PendingInvite),
            "active" => Ok(IdentityStatus::Active),
            other => Err(AppError::internal(format!("invalid identity status: {other}"))),
        }
    }
}

/// Authenticatable account, independent of any facility.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub claim: UserType,
    pub status: IdentityStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbIdentity {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub claim: String,
    pub status: String,
    pub password_hash: Option<String>,
    pub invite_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbIdentity> for Identity {
    type Error = AppError;

    fn try_from(value: DbIdentity) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: parse_uuid(&value.id)?,
            email: value.email,
            display_name: value.display_name,
            claim: UserType::parse(&value.claim)?,
            status: IdentityStatus::parse(&value.status)?,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::validation("email and password are required"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptInviteRequest {
    pub token: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

impl Validate for AcceptInviteRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.token.trim().is_empty() {
            return Err(AppError::validation("token: must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: Profile,
}

impl Loggable for Identity {
    fn entity_type() -> &'static str { "identity" }
    fn subject_id(&self) -> Uuid { self.id }

    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "login" => Severity::Noise,
            _ => Severity::Important,
        }
    }
}
