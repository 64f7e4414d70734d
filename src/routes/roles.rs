//! Role endpoints.
//!
//! Mutations are RPC-style `POST /rpc/*` calls taking the documented JSON
//! shapes; reads live under the facility they belong to. Every outcome is
//! wrapped in the `{statusCode, data, error}` envelope.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use uuid::Uuid;

use super::{actor, MessageResponse};
use crate::app::AppState;
use crate::envelope::Envelope;
use crate::errors::AppResult;
use crate::extract::ValidJson;
use crate::jwt::AuthUser;
use crate::models::role::{CreateRoleRequest, DeleteRoleRequest, Role, UpdateRoleRequest};

#[utoipa::path(
    get,
    path = "/facilities/{facility_id}/roles",
    tag = "Roles",
    params(("facility_id" = Uuid, Path, description = "Facility ID")),
    responses(
        (status = 200, description = "Roles of the facility with their permissions", body = Vec<Role>),
        (status = 403, description = "Missing roles:read (embedded statusCode)")
    )
)]
pub async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(facility_id): Path<Uuid>,
) -> AppResult<Envelope<Vec<Role>>> {
    let roles = state.roles.list_roles(&actor(&auth, &headers), facility_id).await?;
    Ok(Envelope::ok(roles))
}

#[utoipa::path(
    get,
    path = "/facilities/{facility_id}/roles/{role_id}",
    tag = "Roles",
    params(
        ("facility_id" = Uuid, Path, description = "Facility ID"),
        ("role_id" = Uuid, Path, description = "Role ID"),
    ),
    responses(
        (status = 200, description = "Role details", body = Role),
        (status = 404, description = "Role not found in this facility (embedded statusCode)")
    )
)]
pub async fn get_role(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path((facility_id, role_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Envelope<Role>> {
    let role = state.roles.get_role(&actor(&auth, &headers), facility_id, role_id).await?;
    Ok(Envelope::ok(role))
}

#[utoipa::path(
    post,
    path = "/rpc/create-role",
    tag = "Roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 200, description = "Envelope with statusCode 201 and the created role", body = Role),
        (status = 400, description = "Invalid name or permission list (embedded statusCode)"),
        (status = 403, description = "Missing roles:create (embedded statusCode)"),
        (status = 409, description = "Duplicate role name (embedded statusCode)")
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(request): ValidJson<CreateRoleRequest>,
) -> AppResult<Envelope<Role>> {
    let role = state.roles.create_role(&actor(&auth, &headers), request).await?;
    Ok(Envelope::created(role))
}

#[utoipa::path(
    post,
    path = "/rpc/update-role",
    tag = "Roles",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated role", body = Role),
        (status = 400, description = "Invalid name, duplicate pair or empty result (embedded statusCode)"),
        (status = 403, description = "Unknown role or missing roles:update (embedded statusCode)")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(request): ValidJson<UpdateRoleRequest>,
) -> AppResult<Envelope<Role>> {
    let role = state.roles.update_role(&actor(&auth, &headers), request).await?;
    Ok(Envelope::ok(role))
}

#[utoipa::path(
    post,
    path = "/rpc/delete-role",
    tag = "Roles",
    request_body = DeleteRoleRequest,
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 403, description = "Missing roles:delete (embedded statusCode)"),
        (status = 404, description = "Role not found (embedded statusCode)")
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(request): ValidJson<DeleteRoleRequest>,
) -> AppResult<Envelope<MessageResponse>> {
    state.roles.delete_role(&actor(&auth, &headers), request).await?;
    Ok(Envelope::ok(MessageResponse::new("Role deleted successfully")))
}
