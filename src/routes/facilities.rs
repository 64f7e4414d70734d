use axum::extract::{Path, State};
use uuid::Uuid;

use crate::app::AppState;
use crate::envelope::Envelope;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::access::EffectivePermissions;
use crate::models::facility::Facility;
use crate::stores::facilities;

#[utoipa::path(
    get,
    path = "/me/facilities",
    tag = "Facilities",
    responses((status = 200, description = "Facilities the caller works at", body = Vec<Facility>))
)]
pub async fn my_facilities(State(state): State<AppState>, auth: AuthUser) -> AppResult<Envelope<Vec<Facility>>> {
    let facilities = facilities::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Envelope::ok(facilities))
}

/// Effective permissions of the caller inside one facility, for hiding
/// controls client-side. Every mutation re-checks on the server.
#[utoipa::path(
    get,
    path = "/facilities/{facility_id}/permissions/me",
    tag = "Facilities",
    params(("facility_id" = Uuid, Path, description = "Facility ID")),
    responses(
        (status = 200, description = "Effective permissions", body = EffectivePermissions),
        (status = 403, description = "Caller is not an employee of the facility (embedded statusCode)")
    )
)]
pub async fn my_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(facility_id): Path<Uuid>,
) -> AppResult<Envelope<EffectivePermissions>> {
    let principal = state.checker.require_member(auth.user_id, facility_id).await?;
    Ok(Envelope::ok(EffectivePermissions::from(&principal)))
}
