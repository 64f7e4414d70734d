use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::employee::{DbEmployee, DbMembership, DbProfile, Employee, Membership, Profile};
use crate::utils::normalize_email;

const MEMBERSHIP_COLUMNS: &str = "facility_id, user_id, role_id, is_admin, joined_at";

// role name only resolves when the role belongs to the same facility
const EMPLOYEE_SELECT: &str = r#"
    SELECT fe.facility_id, fe.user_id, fe.role_id, r.name AS role_name, fe.is_admin, fe.joined_at,
           p.name, p.email, p.img, p.created_at
    FROM facility_employees fe
    JOIN profiles p ON p.id = fe.user_id
    LEFT JOIN roles r ON r.id = fe.role_id AND r.facility_id = fe.facility_id
"#;

#[derive(Clone)]
pub struct EmployeeStore {
    pool: SqlitePool,
}

impl EmployeeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find_membership(&self, facility_id: Uuid, user_id: Uuid) -> AppResult<Option<Membership>> {
        let sql = format!("SELECT {MEMBERSHIP_COLUMNS} FROM facility_employees WHERE facility_id = ? AND user_id = ?");
        sqlx::query_as::<_, DbMembership>(&sql)
            .bind(facility_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(Membership::try_from)
            .transpose()
    }

    pub async fn list_employees(&self, facility_id: Uuid) -> AppResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE fe.facility_id = ? ORDER BY p.name, fe.user_id");
        sqlx::query_as::<_, DbEmployee>(&sql)
            .bind(facility_id.to_string())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }

    pub async fn get_employee(&self, facility_id: Uuid, user_id: Uuid) -> AppResult<Employee> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE fe.facility_id = ? AND fe.user_id = ?");
        sqlx::query_as::<_, DbEmployee>(&sql)
            .bind(facility_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("employee not found"))?
            .try_into()
    }

    pub async fn profile_email_in_use(&self, email: &str) -> AppResult<bool> {
        Ok(sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE email = ?)")
            .bind(normalize_email(email))
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        sqlx::query_as::<_, DbProfile>("SELECT id, name, email, img, created_at FROM profiles WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("profile not found"))?
            .try_into()
    }
}

pub async fn insert_profile(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    name: &str,
    email: &str,
    created_at: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query("INSERT INTO profiles (id, name, email, img, created_at) VALUES (?, ?, ?, NULL, ?)")
        .bind(user_id.to_string())
        .bind(name.trim())
        .bind(normalize_email(email))
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn insert_membership(conn: &mut SqliteConnection, membership: &Membership) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO facility_employees (facility_id, user_id, role_id, is_admin, joined_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(membership.facility_id.to_string())
    .bind(membership.user_id.to_string())
    .bind(membership.role_id.map(|id| id.to_string()))
    .bind(membership.is_admin)
    .bind(membership.joined_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Returns whether a row was removed.
pub async fn delete_membership(conn: &mut SqliteConnection, facility_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM facility_employees WHERE facility_id = ? AND user_id = ?")
        .bind(facility_id.to_string())
        .bind(user_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_memberships(conn: &mut SqliteConnection, user_id: Uuid) -> AppResult<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(1) FROM facility_employees WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn delete_profile(conn: &mut SqliteConnection, user_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM profiles WHERE id = ?")
        .bind(user_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn update_profile_name(conn: &mut SqliteConnection, user_id: Uuid, name: &str) -> AppResult<()> {
    sqlx::query("UPDATE profiles SET name = ? WHERE id = ?")
        .bind(name.trim())
        .bind(user_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn update_membership_role(
    conn: &mut SqliteConnection,
    facility_id: Uuid,
    user_id: Uuid,
    role_id: Option<Uuid>,
) -> AppResult<()> {
    sqlx::query("UPDATE facility_employees SET role_id = ? WHERE facility_id = ? AND user_id = ?")
        .bind(role_id.map(|id| id.to_string()))
        .bind(facility_id.to_string())
        .bind(user_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}
