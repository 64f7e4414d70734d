#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use norseus_admin::authz::{Permission, PermissionAction, PermissionSection};
use norseus_admin::db;
use norseus_admin::identity::{create_active_identity, IdentityProvider, LogNotifier, SqliteIdentityProvider};
use norseus_admin::jwt::JwtConfig;
use norseus_admin::models::employee::Membership;
use norseus_admin::models::identity::UserType;
use norseus_admin::models::role::Role;
use norseus_admin::router;
use norseus_admin::services::bootstrap::{seed_facility, SeedOutcome, SeedRequest};
use norseus_admin::settings::Settings;
use norseus_admin::stores::employees::{insert_membership, insert_profile};
use norseus_admin::stores::RoleStore;
use norseus_admin::utils::utc_now;
use norseus_admin::AppState;

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub jwt: JwtConfig,
    _dir: TempDir,
}

/// Envelope fields of one response, with the transport status alongside.
#[derive(Debug)]
pub struct Reply {
    pub http: StatusCode,
    pub status_code: u64,
    pub data: Value,
    pub error: Value,
}

impl Reply {
    pub fn error_code(&self) -> &str {
        self.error.get("code").and_then(Value::as_str).unwrap_or_default()
    }
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_settings(Settings::default()).await
    }

    pub async fn with_settings(settings: Settings) -> Result<Self> {
        Self::build(settings, |pool, settings| {
            Arc::new(SqliteIdentityProvider::new(
                pool,
                Arc::new(LogNotifier::new()),
                settings.invite_redirect_url.clone(),
            ))
        })
        .await
    }

    pub async fn with_provider(
        provider: impl FnOnce(SqlitePool) -> Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        Self::build(Settings::default(), |pool, _| provider(pool)).await
    }

    async fn build(
        settings: Settings,
        provider: impl FnOnce(SqlitePool, &Settings) -> Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let dir = tempdir().context("failed to create tempdir")?;
        let db_path = dir.path().join("test.db");
        let pool = db::connect(&format!("sqlite://{}", db_path.display())).await?;

        let jwt = JwtConfig {
            secret: Arc::new(b"test-secret".to_vec()),
            exp_hours: 1,
        };
        let identity = provider(pool.clone(), &settings);
        let state = AppState::with_identity_provider(pool.clone(), jwt.clone(), settings, identity);

        Ok(Self {
            app: router(state),
            pool,
            jwt,
            _dir: dir,
        })
    }

    pub fn token(&self, user_id: Uuid) -> String {
        self.jwt.encode(user_id, UserType::User).expect("token")
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<Reply> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string()))?).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<Reply> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty())?).await
    }

    async fn send(&self, req: Request<Body>) -> Result<Reply> {
        let resp = self.app.clone().oneshot(req).await?;
        let http = resp.status();
        let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let v: Value = serde_json::from_slice(&body_bytes)
            .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&body_bytes)))?;
        Ok(Reply {
            http,
            status_code: v.get("statusCode").and_then(Value::as_u64).unwrap_or_default(),
            data: v.get("data").cloned().unwrap_or(Value::Null),
            error: v.get("error").cloned().unwrap_or(Value::Null),
        })
    }

    pub async fn count(&self, sql: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(sql).fetch_one(&self.pool).await?)
    }
}

/// A facility with an admin who can log in with [`PASSWORD`].
pub async fn seed_admin(pool: &SqlitePool) -> Result<SeedOutcome> {
    let request = SeedRequest {
        facility_name: "Norseus Gym".into(),
        admin_email: "owner@example.com".into(),
        admin_name: "Owner".into(),
        admin_password: PASSWORD.into(),
        staff: None,
    };
    Ok(seed_facility(pool, &request).await?)
}

pub fn perm(section: PermissionSection, action: PermissionAction) -> Permission {
    Permission::new(section, action)
}

pub async fn create_role(pool: &SqlitePool, facility_id: Uuid, name: &str, permissions: &[Permission]) -> Result<Role> {
    Ok(RoleStore::new(pool.clone(), Default::default())
        .create_role(facility_id, name, permissions)
        .await?)
}

/// An active, non-admin employee of `facility_id`.
pub async fn add_employee(pool: &SqlitePool, facility_id: Uuid, email: &str, role_id: Option<Uuid>) -> Result<Uuid> {
    let identity = create_active_identity(pool, email, "Staff", UserType::User, PASSWORD).await?;
    let membership = Membership {
        facility_id,
        user_id: identity.id,
        role_id,
        is_admin: false,
        joined_at: utc_now(),
    };

    let mut tx = pool.begin().await?;
    insert_profile(&mut tx, identity.id, "Staff", email, identity.created_at).await?;
    insert_membership(&mut tx, &membership).await?;
    tx.commit().await?;
    Ok(identity.id)
}
