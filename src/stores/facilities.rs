use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::facility::{DbFacility, Facility};
use crate::utils::utc_now;

pub async fn create_facility(pool: &SqlitePool, name: &str, logo: Option<&str>) -> AppResult<Facility> {
    let id = {
        let mut conn = pool.acquire().await?;
        insert_facility(&mut conn, name, logo).await?
    };
    get_facility(pool, id).await
}

pub async fn insert_facility(conn: &mut SqliteConnection, name: &str, logo: Option<&str>) -> AppResult<Uuid> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name: must not be empty"));
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO facilities (id, name, logo, created_at) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(logo)
        .bind(utc_now())
        .execute(&mut *conn)
        .await?;

    Ok(id)
}

pub async fn get_facility(pool: &SqlitePool, facility_id: Uuid) -> AppResult<Facility> {
    sqlx::query_as::<_, DbFacility>("SELECT id, name, logo, created_at FROM facilities WHERE id = ?")
        .bind(facility_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("facility not found"))?
        .try_into()
}

/// Facilities the user is an employee of.
pub async fn list_for_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Facility>> {
    sqlx::query_as::<_, DbFacility>(
        r#"
        SELECT f.id, f.name, f.logo, f.created_at
        FROM facilities f
        JOIN facility_employees fe ON fe.facility_id = f.id
        WHERE fe.user_id = ?
        ORDER BY f.name, f.id
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(Facility::try_from)
    .collect()
}
