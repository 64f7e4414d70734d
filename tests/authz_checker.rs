mod common;

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use common::{add_employee, create_role, perm, seed_admin, TestApp};
use norseus_admin::authz::PermissionAction::{Create, Delete, Read, Update};
use norseus_admin::authz::PermissionSection::{Employees, Roles};
use norseus_admin::authz::{DefaultPolicyEvaluator, PermissionChecker};
use norseus_admin::settings::RoleNamePolicy;
use norseus_admin::stores::{EmployeeStore, RoleStore};

fn checker(pool: &SqlitePool) -> PermissionChecker {
    PermissionChecker::new(
        EmployeeStore::new(pool.clone()),
        RoleStore::new(pool.clone(), RoleNamePolicy::Reject),
        Arc::new(DefaultPolicyEvaluator::new()),
    )
}

#[tokio::test]
async fn role_grants_only_its_exact_pairs() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "DESK", &[perm(Employees, Create), perm(Employees, Read)]).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "desk@example.com", Some(role.id)).await?;
    let checker = checker(&t.pool);

    assert!(checker.authorize(staff, seed.facility.id, Employees, Create).await);
    assert!(checker.authorize(staff, seed.facility.id, Employees, Read).await);
    assert!(!checker.authorize(staff, seed.facility.id, Employees, Delete).await);
    assert!(!checker.authorize(staff, seed.facility.id, Roles, Create).await);
    Ok(())
}

#[tokio::test]
async fn admin_is_allowed_everything_in_own_facility_only() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let other = norseus_admin::stores::facilities::create_facility(&t.pool, "Other Gym", None).await?;
    let checker = checker(&t.pool);

    for action in [Create, Read, Update, Delete] {
        assert!(checker.authorize(seed.admin.id, seed.facility.id, Roles, action).await);
        assert!(checker.authorize(seed.admin.id, seed.facility.id, Employees, action).await);
    }
    assert!(!checker.authorize(seed.admin.id, other.id, Roles, Read).await);
    Ok(())
}

#[tokio::test]
async fn employee_without_role_is_denied() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "norole@example.com", None).await?;
    let checker = checker(&t.pool);

    assert!(!checker.authorize(staff, seed.facility.id, Employees, Read).await);
    assert!(checker.is_facility_employee(staff, seed.facility.id).await?);

    let principal = checker.require_member(staff, seed.facility.id).await?;
    assert!(principal.effective_permissions().is_empty());
    Ok(())
}

#[tokio::test]
async fn deleted_role_stops_granting() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "DESK", &[perm(Employees, Read)]).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "desk@example.com", Some(role.id)).await?;
    let checker = checker(&t.pool);
    assert!(checker.authorize(staff, seed.facility.id, Employees, Read).await);

    RoleStore::new(t.pool.clone(), RoleNamePolicy::Reject)
        .delete_role(seed.facility.id, role.id)
        .await?;
    assert!(!checker.authorize(staff, seed.facility.id, Employees, Read).await);
    Ok(())
}

#[tokio::test]
async fn role_from_another_facility_is_unresolved() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let other = norseus_admin::stores::facilities::create_facility(&t.pool, "Other Gym", None).await?;
    let foreign = create_role(&t.pool, other.id, "DESK", &[perm(Employees, Read)]).await?;
    let staff = add_employee(&t.pool, seed.facility.id, "desk@example.com", Some(foreign.id)).await?;
    let checker = checker(&t.pool);

    let principal = checker.load_principal(staff, seed.facility.id).await?.expect("member");
    assert_eq!(principal.role_id, Some(foreign.id));
    assert!(!checker.authorize(staff, seed.facility.id, Employees, Read).await);
    Ok(())
}

#[tokio::test]
async fn unknown_user_is_not_a_member() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let checker = checker(&t.pool);
    let stranger = Uuid::new_v4();

    assert!(checker.load_principal(stranger, seed.facility.id).await?.is_none());
    assert!(checker.require(stranger, seed.facility.id, Roles, Read).await.is_err());
    assert!(!checker.is_facility_employee(stranger, seed.facility.id).await?);
    Ok(())
}
