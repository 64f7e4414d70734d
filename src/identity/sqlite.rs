use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{IdentityProvider, Invitation, Notifier};
use crate::db::is_unique_violation;
use crate::errors::{AppError, AppResult};
use crate::models::identity::{DbIdentity, Identity, IdentityStatus, UserType};
use crate::utils::{generate_invite_token, hash_password, normalize_email, utc_now, verify_password};

const IDENTITY_COLUMNS: &str =
    "id, email, display_name, claim, status, password_hash, invite_token, created_at, updated_at";

/// Identity accounts stored next to the application data.
#[derive(Clone)]
pub struct SqliteIdentityProvider {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    invite_redirect_url: String,
}

impl SqliteIdentityProvider {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>, invite_redirect_url: impl Into<String>) -> Self {
        Self {
            pool,
            notifier,
            invite_redirect_url: invite_redirect_url.into(),
        }
    }

    fn invite_link(&self, token: &str) -> String {
        let separator = if self.invite_redirect_url.contains('?') { '&' } else { '?' };
        format!("{}{}token={}", self.invite_redirect_url, separator, token)
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        fetch_by_email(&self.pool, email)
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn create_invited(&self, email: &str, display_name: &str) -> AppResult<Identity> {
        let id = Uuid::new_v4();
        let now = utc_now();

        sqlx::query(
            "INSERT INTO identities (id, email, display_name, claim, status, password_hash, invite_token, created_at, updated_at) VALUES (?, ?, ?, ?, ?, NULL, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(normalize_email(email))
        .bind(display_name.trim())
        .bind(UserType::default().as_str())
        .bind(IdentityStatus::PendingInvite.as_str())
        .bind(generate_invite_token())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::conflict("email already registered")
            } else {
                AppError::from(err)
            }
        })?;

        fetch_by_id(&self.pool, id).await?.try_into()
    }

    async fn set_claim(&self, identity_id: Uuid, claim: UserType) -> AppResult<()> {
        let result = sqlx::query("UPDATE identities SET claim = ?, updated_at = ? WHERE id = ?")
            .bind(claim.as_str())
            .bind(utc_now())
            .bind(identity_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("identity not found"));
        }
        Ok(())
    }

    async fn delete(&self, identity_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM identities WHERE id = ?")
            .bind(identity_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("identity not found"));
        }
        Ok(())
    }

    async fn send_invite(&self, identity: &Identity) -> AppResult<()> {
        let token: Option<String> = sqlx::query_scalar(
            "SELECT invite_token FROM identities WHERE id = ? AND status = 'pending_invite'",
        )
        .bind(identity.id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        let token = token.ok_or_else(|| AppError::invalid_argument("identity has no pending invitation"))?;

        let invitation = Invitation {
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            link: self.invite_link(&token),
        };
        self.notifier.send_invite(&invitation).await
    }
}

async fn fetch_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbIdentity>> {
    let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = ?");
    Ok(sqlx::query_as::<_, DbIdentity>(&sql)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?)
}

async fn fetch_by_id(pool: &SqlitePool, id: Uuid) -> AppResult<DbIdentity> {
    let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?");
    sqlx::query_as::<_, DbIdentity>(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("identity not found"))
}

/// Checks credentials of an active identity.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> AppResult<Identity> {
    let invalid = || AppError::unauthorized("invalid credentials");

    let db_identity = fetch_by_email(pool, email).await?.ok_or_else(invalid)?;
    if db_identity.status != IdentityStatus::Active.as_str() {
        return Err(invalid());
    }
    let password_hash = db_identity.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(password, password_hash)? {
        return Err(invalid());
    }

    db_identity.try_into()
}

/// Activates an invited identity: `pending_invite -> active`.
pub async fn accept_invite(pool: &SqlitePool, token: &str, password: &str) -> AppResult<Identity> {
    let password_hash = hash_password(password)?;

    let id: Option<String> = sqlx::query_scalar(
        "SELECT id FROM identities WHERE invite_token = ? AND status = 'pending_invite'",
    )
    .bind(token.trim())
    .fetch_optional(pool)
    .await?;
    let id = id.ok_or_else(|| AppError::not_found("invitation not found or already used"))?;

    sqlx::query(
        "UPDATE identities SET status = 'active', password_hash = ?, invite_token = NULL, updated_at = ? WHERE id = ?",
    )
    .bind(password_hash)
    .bind(utc_now())
    .bind(&id)
    .execute(pool)
    .await?;

    fetch_by_id(pool, crate::db::row_parsers::parse_uuid(&id)?).await?.try_into()
}

/// Creates an identity that can log in straight away. Used for bootstrap.
pub async fn create_active_identity(
    pool: &SqlitePool,
    email: &str,
    display_name: &str,
    claim: UserType,
    password: &str,
) -> AppResult<Identity> {
    let id = {
        let mut conn = pool.acquire().await?;
        insert_active_identity(&mut conn, email, display_name, claim, password).await?
    };
    get_identity(pool, id).await
}

/// Connection-level insert so callers can provision inside their own transaction.
pub async fn insert_active_identity(
    conn: &mut SqliteConnection,
    email: &str,
    display_name: &str,
    claim: UserType,
    password: &str,
) -> AppResult<Uuid> {
    let password_hash = hash_password(password)?;
    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO identities (id, email, display_name, claim, status, password_hash, invite_token, created_at, updated_at) VALUES (?, ?, ?, ?, 'active', ?, NULL, ?, ?)",
    )
    .bind(id.to_string())
    .bind(normalize_email(email))
    .bind(display_name.trim())
    .bind(claim.as_str())
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::conflict("email already registered")
        } else {
            AppError::from(err)
        }
    })?;

    Ok(id)
}

pub async fn get_identity(pool: &SqlitePool, id: Uuid) -> AppResult<Identity> {
    fetch_by_id(pool, id).await?.try_into()
}
