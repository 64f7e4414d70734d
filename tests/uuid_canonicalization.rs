mod common;

use anyhow::Result;

use common::{add_employee, create_role, perm, seed_admin, TestApp};
use norseus_admin::authz::PermissionAction::Read;
use norseus_admin::authz::PermissionSection::Roles;

#[tokio::test]
async fn uuid_storage_is_text_for_new_rows() -> Result<()> {
    let t = TestApp::new().await?;
    let seed = seed_admin(&t.pool).await?;
    let role = create_role(&t.pool, seed.facility.id, "COACH", &[perm(Roles, Read)]).await?;
    add_employee(&t.pool, seed.facility.id, "coach@example.com", Some(role.id)).await?;

    for (table, column) in [
        ("facilities", "id"),
        ("identities", "id"),
        ("profiles", "id"),
        ("roles", "id"),
        ("roles", "facility_id"),
        ("facility_employees", "user_id"),
        ("facility_employees", "role_id"),
    ] {
        let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
            "SELECT typeof({column}), length({column}) FROM {table} WHERE {column} IS NOT NULL"
        ))
        .fetch_all(&t.pool)
        .await?;
        assert!(!rows.is_empty(), "{table}.{column} has no rows");
        for (kind, len) in rows {
            assert_eq!(kind, "text", "{table}.{column} stored as {kind}");
            assert_eq!(len, 36, "{table}.{column} is not hyphenated");
        }
    }
    Ok(())
}
