mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use common::{add_employee, create_role, perm, seed_admin, TestApp};
use norseus_admin::authz::PermissionAction::{Create, Delete, Read, Update};
use norseus_admin::authz::PermissionSection::Employees;
use norseus_admin::errors::{AppError, AppResult};
use norseus_admin::identity::{IdentityProvider, LogNotifier, SqliteIdentityProvider};
use norseus_admin::models::identity::{Identity, UserType};
use norseus_admin::settings::{EmployeeDeleteMode, Settings};

/// Real provider whose deletes always fail.
struct StickyProvider {
    inner: SqliteIdentityProvider,
}

impl StickyProvider {
    fn boxed(pool: SqlitePool) -> Arc<dyn IdentityProvider> {
        Arc::new(Self {
            inner: SqliteIdentityProvider::new(pool, Arc::new(LogNotifier::new()), "http://localhost/verify"),
        })
    }
}

#[async_trait]
impl IdentityProvider for StickyProvider {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        self.inner.find_by_email(email).await
    }

    async fn create_invited(&self, email: &str, display_name: &str) -> AppResult<Identity> {
        self.inner.create_invited(email, display_name).await
    }

    async fn set_claim(&self, identity_id: Uuid, claim: UserType) -> AppResult<()> {
        self.inner.set_claim(identity_id, claim).await
    }

    async fn delete(&self, _identity_id: Uuid) -> AppResult<()> {
        Err(AppError::internal("identity backend unavailable"))
    }

    async fn send_invite(&self, identity: &Identity) -> AppResult<()> {
        self.inner.send_invite(identity).await
    }
}

async fn block_memberships(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TRIGGER block_memberships BEFORE INSERT ON facility_employees BEGIN SELECT RAISE(ABORT, 'blocked'); END",
    )
    .execute(pool)
    .await?;
    Ok(())
}

fn create_body(email: &str, role_id: Uuid, facility_id: Uuid) -> serde_json::Value {
    json!({
        "email": email,
        "name": "New Coach",
        "roleId": role_id,
        "facilityId": facility_id,
        "userType": "user"
    })
}

#[tokio::test]
async fn create_employee_provisions_pending_identity() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "COACH", &[perm(Employees, Read)]).await?;

    let reply = t
        .post(
            "/rpc/create-employee",
            Some(&t.token(seed.admin.id)),
            create_body("Coach@Example.com", role.id, seed.facility.id),
        )
        .await?;
    assert_eq!(reply.http, StatusCode::OK);
    assert_eq!(reply.status_code, 201, "unexpected reply: {:?}", reply);
    assert_eq!(reply.data["status"], "pending_invite");

    let status: String = sqlx::query_scalar("SELECT status FROM identities WHERE email = 'coach@example.com'")
        .fetch_one(&t.pool)
        .await?;
    assert_eq!(status, "pending_invite");

    let listed = t
        .get(&format!("/facilities/{}/employees", seed.facility.id), Some(&t.token(seed.admin.id)))
        .await?;
    let employees = listed.data.as_array().cloned().unwrap_or_default();
    assert_eq!(employees.len(), 2);
    assert!(employees.iter().any(|e| e["roleName"] == "COACH" && e["profile"]["email"] == "coach@example.com"));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts_without_writes() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "COACH", &[perm(Employees, Read)]).await?;
    let identities = t.count("SELECT COUNT(1) FROM identities").await?;

    let reply = t
        .post(
            "/rpc/create-employee",
            Some(&t.token(seed.admin.id)),
            create_body("OWNER@example.com", role.id, seed.facility.id),
        )
        .await?;
    assert_eq!(reply.status_code, 409);
    assert_eq!(reply.error_code(), "conflict");
    assert_eq!(t.count("SELECT COUNT(1) FROM identities").await?, identities);
    assert_eq!(t.count("SELECT COUNT(1) FROM facility_employees").await?, 1);
    Ok(())
}

#[tokio::test]
async fn role_from_another_facility_is_not_found() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let other = norseus_admin::stores::facilities::create_facility(&t.pool, "Other Gym", None).await?;
    let foreign = create_role(&t.pool, other.id, "COACH", &[perm(Employees, Read)]).await?;

    let reply = t
        .post(
            "/rpc/create-employee",
            Some(&t.token(seed.admin.id)),
            create_body("coach@example.com", foreign.id, seed.facility.id),
        )
        .await?;
    assert_eq!(reply.status_code, 404);
    assert_eq!(t.count("SELECT COUNT(1) FROM identities").await?, 1);
    Ok(())
}

#[tokio::test]
async fn caller_without_create_permission_is_denied() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let reader = create_role(&t.pool, seed.facility.id, "READER", &[perm(Employees, Read)]).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "staff@example.com", Some(reader.id)).await?;

    let reply = t
        .post(
            "/rpc/create-employee",
            Some(&t.token(staff)),
            create_body("coach@example.com", reader.id, seed.facility.id),
        )
        .await?;
    assert_eq!(reply.status_code, 403);
    assert_eq!(t.count("SELECT COUNT(1) FROM identities").await?, 2);
    Ok(())
}

#[tokio::test]
async fn failed_membership_insert_removes_identity() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "COACH", &[perm(Employees, Read)]).await?;
    block_memberships(&t.pool).await?;

    let reply = t
        .post(
            "/rpc/create-employee",
            Some(&t.token(seed.admin.id)),
            create_body("coach@example.com", role.id, seed.facility.id),
        )
        .await?;
    assert_eq!(reply.http, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error_code(), "persistence");

    assert_eq!(t.count("SELECT COUNT(1) FROM identities WHERE email = 'coach@example.com'").await?, 0);
    assert_eq!(t.count("SELECT COUNT(1) FROM profiles WHERE email = 'coach@example.com'").await?, 0);
    Ok(())
}

#[tokio::test]
async fn failed_compensation_reports_inconsistent_state() -> Result<()> {
    let t = TestApp::with_provider(StickyProvider::boxed).await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "COACH", &[perm(Employees, Read)]).await?;
    block_memberships(&t.pool).await?;

    let reply = t
        .post(
            "/rpc/create-employee",
            Some(&t.token(seed.admin.id)),
            create_body("coach@example.com", role.id, seed.facility.id),
        )
        .await?;
    assert_eq!(reply.http, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.status_code, 500);
    assert_eq!(reply.error_code(), "inconsistent_state");

    // the orphan is still there for an operator to clean up
    assert_eq!(t.count("SELECT COUNT(1) FROM identities WHERE email = 'coach@example.com'").await?, 1);
    Ok(())
}

#[tokio::test]
async fn self_delete_is_rejected_first() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;

    let reply = t
        .post(
            "/rpc/delete-employee",
            Some(&t.token(seed.admin.id)),
            json!({"userId": seed.admin.id, "facilityId": seed.facility.id}),
        )
        .await?;
    assert_eq!(reply.status_code, 400);
    assert_eq!(reply.error_code(), "invalid_argument");
    assert_eq!(t.count("SELECT COUNT(1) FROM facility_employees").await?, 1);
    Ok(())
}

#[tokio::test]
async fn outsider_cannot_delete_employees() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "staff@example.com", None).await?;
    let other = norseus_admin::stores::facilities::create_facility(&t.pool, "Other Gym", None).await?;
    let outsider = add_employee(&t.pool, other.id, "outsider@example.com", None).await?;

    let reply = t
        .post(
            "/rpc/delete-employee",
            Some(&t.token(outsider)),
            json!({"userId": staff, "facilityId": seed.facility.id}),
        )
        .await?;
    assert_eq!(reply.status_code, 403);
    assert_eq!(t.count("SELECT COUNT(1) FROM facility_employees").await?, 3);
    Ok(())
}

#[tokio::test]
async fn deleting_a_non_employee_is_not_found() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;

    let reply = t
        .post(
            "/rpc/delete-employee",
            Some(&t.token(seed.admin.id)),
            json!({"userId": Uuid::new_v4(), "facilityId": seed.facility.id}),
        )
        .await?;
    assert_eq!(reply.status_code, 404);
    Ok(())
}

#[tokio::test]
async fn hard_delete_removes_identity() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "MANAGER", &[perm(Employees, Delete)]).await?;
    let manager = add_employee(&t.pool, seed.facility.id, "manager@example.com", Some(role.id)).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "staff@example.com", None).await?;

    let reply = t
        .post(
            "/rpc/delete-employee",
            Some(&t.token(manager)),
            json!({"userId": staff, "facilityId": seed.facility.id}),
        )
        .await?;
    assert_eq!(reply.status_code, 200, "unexpected reply: {:?}", reply);
    assert_eq!(reply.data["message"], "Employee deleted successfully");

    assert_eq!(t.count("SELECT COUNT(1) FROM identities WHERE email = 'staff@example.com'").await?, 0);
    assert_eq!(t.count("SELECT COUNT(1) FROM profiles WHERE email = 'staff@example.com'").await?, 0);
    Ok(())
}

#[tokio::test]
async fn hard_delete_keeps_identity_with_other_memberships() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "staff@example.com", None).await?;
    let other = norseus_admin::stores::facilities::create_facility(&t.pool, "Other Gym", None).await?;
    sqlx::query("INSERT INTO facility_employees (facility_id, user_id, role_id, is_admin, joined_at) VALUES (?, ?, NULL, 0, datetime('now'))")
        .bind(other.id.to_string())
        .bind(staff.to_string())
        .execute(&t.pool)
        .await?;

    let reply = t
        .post(
            "/rpc/delete-employee",
            Some(&t.token(seed.admin.id)),
            json!({"userId": staff, "facilityId": seed.facility.id}),
        )
        .await?;
    assert_eq!(reply.status_code, 200);
    assert_eq!(t.count("SELECT COUNT(1) FROM identities WHERE email = 'staff@example.com'").await?, 1);
    assert_eq!(t.count("SELECT COUNT(1) FROM facility_employees WHERE user_id IN (SELECT id FROM identities WHERE email = 'staff@example.com')").await?, 1);
    Ok(())
}

#[tokio::test]
async fn soft_delete_keeps_identity() -> Result<()> {
    let settings = Settings {
        employee_delete_mode: EmployeeDeleteMode::Soft,
        ..Settings::default()
    };
    let t = TestApp::with_settings(settings).await?;
    let seed = seed_admin(&t.pool).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "staff@example.com", None).await?;

    let reply = t
        .post(
            "/rpc/delete-employee",
            Some(&t.token(seed.admin.id)),
            json!({"userId": staff, "facilityId": seed.facility.id}),
        )
        .await?;
    assert_eq!(reply.status_code, 200);
    assert_eq!(t.count("SELECT COUNT(1) FROM facility_employees").await?, 1);
    assert_eq!(t.count("SELECT COUNT(1) FROM identities WHERE email = 'staff@example.com'").await?, 1);
    Ok(())
}

#[tokio::test]
async fn identity_delete_failure_is_inconsistent() -> Result<()> {
    let t = TestApp::with_provider(StickyProvider::boxed).await?;
    let seed = seed_admin(&t.pool).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "staff@example.com", None).await?;

    let reply = t
        .post(
            "/rpc/delete-employee",
            Some(&t.token(seed.admin.id)),
            json!({"userId": staff, "facilityId": seed.facility.id}),
        )
        .await?;
    assert_eq!(reply.http, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error_code(), "inconsistent_state");
    assert_eq!(t.count("SELECT COUNT(1) FROM facility_employees").await?, 1);
    Ok(())
}

#[tokio::test]
async fn update_employee_renames_and_reassigns() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let editor = create_role(&t.pool, seed.facility.id, "EDITOR", &[perm(Employees, Update), perm(Employees, Create)]).await?;
    let coach = create_role(&t.pool, seed.facility.id, "COACH", &[perm(Employees, Read)]).await?;
    let manager = add_employee(&t.pool, seed.facility.id, "manager@example.com", Some(editor.id)).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "staff@example.com", None).await?;

    let reply = t
        .post(
            "/rpc/update-employee",
            Some(&t.token(manager)),
            json!({"userId": staff, "facilityId": seed.facility.id, "name": "Renamed", "roleId": coach.id}),
        )
        .await?;
    assert_eq!(reply.status_code, 200, "unexpected reply: {:?}", reply);
    assert_eq!(reply.data["profile"]["name"], "Renamed");
    assert_eq!(reply.data["roleName"], "COACH");

    let unknown_role = t
        .post(
            "/rpc/update-employee",
            Some(&t.token(manager)),
            json!({"userId": staff, "facilityId": seed.facility.id, "name": "Renamed", "roleId": Uuid::new_v4()}),
        )
        .await?;
    assert_eq!(unknown_role.status_code, 404);
    Ok(())
}
