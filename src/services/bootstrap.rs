use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::identity::{get_identity, insert_active_identity};
use crate::models::employee::Membership;
use crate::models::facility::Facility;
use crate::models::identity::{Identity, UserType};
use crate::stores::employees::{insert_membership, insert_profile};
use crate::stores::facilities::{get_facility, insert_facility};
use crate::stores::EmployeeStore;
use crate::utils::{is_valid_email, utc_now};

#[derive(Debug, Clone)]
pub struct SeedRequest {
    pub facility_name: String,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: String,
    /// Optional plain employee: no admin flag, no role.
    pub staff: Option<StaffSeed>,
}

#[derive(Debug, Clone)]
pub struct StaffSeed {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub facility: Facility,
    pub admin: Identity,
    pub staff: Option<Identity>,
}

/// Creates a facility and its first admin, who can log in immediately.
///
/// Every row is written in one transaction; a failure leaves nothing behind
/// and the seed can be retried.
pub async fn seed_facility(pool: &SqlitePool, request: &SeedRequest) -> AppResult<SeedOutcome> {
    if request.facility_name.trim().is_empty() {
        return Err(AppError::validation("facilityName: must not be empty"));
    }
    validate_person(&request.admin_email, &request.admin_name)?;
    if let Some(staff) = &request.staff {
        validate_person(&staff.email, &staff.name)?;
        if staff.email.trim().eq_ignore_ascii_case(request.admin_email.trim()) {
            return Err(AppError::validation("staffEmail: must differ from the admin email"));
        }
    }

    let store = EmployeeStore::new(pool.clone());
    let emails = std::iter::once(request.admin_email.as_str()).chain(request.staff.iter().map(|s| s.email.as_str()));
    for email in emails {
        if store.profile_email_in_use(email).await? {
            return Err(AppError::conflict("email already registered"));
        }
    }

    let mut tx = pool.begin().await?;
    let facility_id = insert_facility(&mut tx, &request.facility_name, None).await?;
    let admin_id = enroll(
        &mut tx,
        facility_id,
        &request.admin_email,
        &request.admin_name,
        &request.admin_password,
        UserType::Admin,
        true,
    )
    .await?;
    let staff_id = match &request.staff {
        Some(staff) => {
            Some(enroll(&mut tx, facility_id, &staff.email, &staff.name, &staff.password, UserType::User, false).await?)
        }
        None => None,
    };
    tx.commit().await?;

    let facility = get_facility(pool, facility_id).await?;
    let admin = get_identity(pool, admin_id).await?;
    let staff = match staff_id {
        Some(id) => Some(get_identity(pool, id).await?),
        None => None,
    };

    tracing::info!(facility_id = %facility.id, admin_id = %admin.id, with_staff = staff.is_some(), "facility seeded");
    Ok(SeedOutcome { facility, admin, staff })
}

fn validate_person(email: &str, name: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::validation("email: Invalid email format"));
    }
    if name.trim().is_empty() {
        return Err(AppError::validation("name: Name is required"));
    }
    Ok(())
}

/// Active identity, profile and membership for one person.
async fn enroll(
    conn: &mut SqliteConnection,
    facility_id: Uuid,
    email: &str,
    name: &str,
    password: &str,
    claim: UserType,
    is_admin: bool,
) -> AppResult<Uuid> {
    let user_id = insert_active_identity(&mut *conn, email, name, claim, password).await?;
    let joined_at = utc_now();
    insert_profile(&mut *conn, user_id, name, email, joined_at).await?;
    insert_membership(
        &mut *conn,
        &Membership {
            facility_id,
            user_id,
            role_id: None,
            is_admin,
            joined_at,
        },
    )
    .await?;
    Ok(user_id)
}
