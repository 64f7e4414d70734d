use axum::extract::{Path, State};
use axum::http::HeaderMap;
use uuid::Uuid;

use super::{actor, MessageResponse};
use crate::app::AppState;
use crate::envelope::Envelope;
use crate::errors::AppResult;
use crate::extract::ValidJson;
use crate::jwt::AuthUser;
use crate::models::employee::{
    CreateEmployeeRequest, DeleteEmployeeRequest, Employee, EmployeeRef, UpdateEmployeeRequest,
};

#[utoipa::path(
    get,
    path = "/facilities/{facility_id}/employees",
    tag = "Employees",
    params(("facility_id" = Uuid, Path, description = "Facility ID")),
    responses(
        (status = 200, description = "Employees with profile and role name", body = Vec<Employee>),
        (status = 403, description = "Missing employees:read (embedded statusCode)")
    )
)]
pub async fn list_employees(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(facility_id): Path<Uuid>,
) -> AppResult<Envelope<Vec<Employee>>> {
    let employees = state.employees.list_employees(&actor(&auth, &headers), facility_id).await?;
    Ok(Envelope::ok(employees))
}

/// Invites a new employee into the facility.
#[utoipa::path(
    post,
    path = "/rpc/create-employee",
    tag = "Employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 200, description = "Envelope with statusCode 201 and the pending employee", body = EmployeeRef),
        (status = 403, description = "Missing employees:create (embedded statusCode)"),
        (status = 404, description = "Role not found in facility (embedded statusCode)"),
        (status = 409, description = "Email already registered (embedded statusCode)"),
        (status = 500, description = "Provisioning failed; may report an inconsistent state")
    )
)]
pub async fn create_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(request): ValidJson<CreateEmployeeRequest>,
) -> AppResult<Envelope<EmployeeRef>> {
    let employee = state.employees.create_employee(&actor(&auth, &headers), request).await?;
    Ok(Envelope::created(employee))
}

#[utoipa::path(
    post,
    path = "/rpc/delete-employee",
    tag = "Employees",
    request_body = DeleteEmployeeRequest,
    responses(
        (status = 200, description = "Employee removed", body = MessageResponse),
        (status = 400, description = "Self-deletion (embedded statusCode)"),
        (status = 403, description = "Not an employee or missing employees:delete (embedded statusCode)"),
        (status = 404, description = "Target is not an employee (embedded statusCode)")
    )
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(request): ValidJson<DeleteEmployeeRequest>,
) -> AppResult<Envelope<MessageResponse>> {
    state.employees.delete_employee(&actor(&auth, &headers), request).await?;
    Ok(Envelope::ok(MessageResponse::new("Employee deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/rpc/update-employee",
    tag = "Employees",
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Updated employee", body = Employee),
        (status = 403, description = "Missing employees:update (embedded statusCode)"),
        (status = 404, description = "Employee or role not found (embedded statusCode)")
    )
)]
pub async fn update_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(request): ValidJson<UpdateEmployeeRequest>,
) -> AppResult<Envelope<Employee>> {
    let employee = state.employees.update_employee(&actor(&auth, &headers), request).await?;
    Ok(Envelope::ok(employee))
}
