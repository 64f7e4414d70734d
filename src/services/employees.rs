//! Employee provisioning and removal.
//!
//! Creating an employee spans the identity provider and the application
//! database, so it runs as a small saga: once the identity exists, any later
//! failure removes it again. When that removal fails too the caller gets
//! [`AppError::InconsistentState`] naming the step and the orphaned id.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::Actor;
use crate::authz::{PermissionAction, PermissionChecker, PermissionSection};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, EventBus, Loggable, Severity};
use crate::extract::Validate;
use crate::identity::IdentityProvider;
use crate::models::employee::{
    CreateEmployeeRequest, DeleteEmployeeRequest, Employee, EmployeeRef, EmployeeStatus, Membership,
    UpdateEmployeeRequest,
};
use crate::models::identity::UserType;
use crate::settings::EmployeeDeleteMode;
use crate::stores::employees::{
    count_memberships, delete_membership, delete_profile, insert_membership, insert_profile, update_membership_role,
    update_profile_name,
};
use crate::stores::{EmployeeStore, RoleStore};
use crate::utils::utc_now;

/// Audit record for an identity left behind by a failed saga.
#[derive(Debug, Serialize)]
struct OrphanedIdentity {
    identity_id: Uuid,
    facility_id: Uuid,
    step: &'static str,
    cause: String,
}

impl Loggable for OrphanedIdentity {
    fn entity_type() -> &'static str { "identity" }
    fn subject_id(&self) -> Uuid { self.identity_id }
    fn facility_id(&self) -> Option<Uuid> { Some(self.facility_id) }
    fn severity_for_action(&self, _action: &str) -> Severity { Severity::Critical }
}

#[derive(Clone)]
pub struct EmployeeLifecycle {
    employees: EmployeeStore,
    roles: RoleStore,
    checker: PermissionChecker,
    identity: Arc<dyn IdentityProvider>,
    event_bus: EventBus,
    delete_mode: EmployeeDeleteMode,
}

impl EmployeeLifecycle {
    pub fn new(
        employees: EmployeeStore,
        roles: RoleStore,
        checker: PermissionChecker,
        identity: Arc<dyn IdentityProvider>,
        event_bus: EventBus,
        delete_mode: EmployeeDeleteMode,
    ) -> Self {
        Self {
            employees,
            roles,
            checker,
            identity,
            event_bus,
            delete_mode,
        }
    }

    pub async fn list_employees(&self, actor: &Actor, facility_id: Uuid) -> AppResult<Vec<Employee>> {
        self.checker
            .require(actor.user_id, facility_id, PermissionSection::Employees, PermissionAction::Read)
            .await?;
        self.employees.list_employees(facility_id).await
    }

    /// `{none} -> pending_invite`.
    pub async fn create_employee(&self, actor: &Actor, request: CreateEmployeeRequest) -> AppResult<EmployeeRef> {
        request.validate()?;
        let facility_id = request.facility_id;
        self.checker
            .require(actor.user_id, facility_id, PermissionSection::Employees, PermissionAction::Create)
            .await?;

        if !self.roles.role_exists_in_facility(facility_id, request.role_id).await? {
            return Err(AppError::not_found("role not found"));
        }

        if self.identity.find_by_email(&request.email).await?.is_some()
            || self.employees.profile_email_in_use(&request.email).await?
        {
            return Err(AppError::conflict("email already registered"));
        }

        // Nothing exists yet, so a failure here needs no cleanup.
        let identity = self.identity.create_invited(&request.email, &request.name).await?;
        tracing::info!(identity_id = %identity.id, %facility_id, "identity provisioned");

        if let Err(err) = self.identity.set_claim(identity.id, request.user_type).await {
            return Err(self.compensate(identity.id, facility_id, "set_claim", err).await);
        }

        let membership = Membership {
            facility_id,
            user_id: identity.id,
            role_id: Some(request.role_id),
            is_admin: request.user_type == UserType::Admin,
            joined_at: utc_now(),
        };
        if let Err(err) = self.persist_employee(&request, &membership).await {
            return Err(self.compensate(identity.id, facility_id, "persist_employee", err).await);
        }

        if let Err(err) = self.identity.send_invite(&identity).await {
            tracing::warn!(identity_id = %identity.id, error = %err, "invitation could not be sent");
        }

        let employee = EmployeeRef {
            user_id: identity.id,
            facility_id,
            status: EmployeeStatus::PendingInvite,
        };
        log_activity(&self.event_bus, "created", Some(actor.user_id), &employee, None, actor.context.clone());
        Ok(employee)
    }

    async fn persist_employee(&self, request: &CreateEmployeeRequest, membership: &Membership) -> AppResult<()> {
        let mut tx = self.employees.pool().begin().await?;
        insert_profile(&mut tx, membership.user_id, &request.name, &request.email, membership.joined_at).await?;
        insert_membership(&mut tx, membership).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Removes a freshly provisioned identity after a later step failed and
    /// returns the error to report.
    async fn compensate(&self, identity_id: Uuid, facility_id: Uuid, step: &'static str, cause: AppError) -> AppError {
        match self.identity.delete(identity_id).await {
            Ok(()) => {
                tracing::warn!(%identity_id, step, error = %cause, "employee creation rolled back");
                cause
            }
            Err(cleanup) => {
                tracing::error!(
                    %identity_id,
                    %facility_id,
                    step,
                    error = %cause,
                    cleanup_error = %cleanup,
                    "employee creation left an orphaned identity"
                );
                let orphan = OrphanedIdentity {
                    identity_id,
                    facility_id,
                    step,
                    cause: cause.to_string(),
                };
                log_activity(&self.event_bus, "orphaned", None, &orphan, None, None);
                AppError::inconsistent(format!(
                    "{step} failed ({cause}); identity {identity_id} could not be removed ({cleanup})"
                ))
            }
        }
    }

    /// `active | pending_invite -> removed`.
    pub async fn delete_employee(&self, actor: &Actor, request: DeleteEmployeeRequest) -> AppResult<()> {
        request.validate()?;
        let facility_id = request.facility_id;

        if request.user_id == actor.user_id {
            return Err(AppError::invalid_argument("you cannot delete your own employee account"));
        }

        if !self.checker.is_facility_employee(actor.user_id, facility_id).await? {
            return Err(AppError::PermissionDenied);
        }
        self.checker
            .require(actor.user_id, facility_id, PermissionSection::Employees, PermissionAction::Delete)
            .await?;

        let previous = self.employees.get_employee(facility_id, request.user_id).await?;

        let mut tx = self.employees.pool().begin().await?;
        if !delete_membership(&mut tx, facility_id, request.user_id).await? {
            return Err(AppError::not_found("employee not found"));
        }
        let remove_identity = match self.delete_mode {
            EmployeeDeleteMode::Hard => count_memberships(&mut tx, request.user_id).await? == 0,
            EmployeeDeleteMode::Soft => false,
        };
        if remove_identity {
            delete_profile(&mut tx, request.user_id).await?;
        }
        tx.commit().await?;

        if remove_identity {
            match self.identity.delete(request.user_id).await {
                Ok(()) | Err(AppError::NotFound(_)) => {}
                Err(err) => {
                    tracing::error!(
                        user_id = %request.user_id,
                        %facility_id,
                        error = %err,
                        "membership removed but identity could not be deleted"
                    );
                    let orphan = OrphanedIdentity {
                        identity_id: request.user_id,
                        facility_id,
                        step: "delete_identity",
                        cause: err.to_string(),
                    };
                    log_activity(&self.event_bus, "orphaned", Some(actor.user_id), &orphan, None, None);
                    return Err(AppError::inconsistent(format!(
                        "identity {} could not be deleted after removing its membership ({err})",
                        request.user_id
                    )));
                }
            }
        }

        tracing::info!(user_id = %request.user_id, %facility_id, identity_removed = remove_identity, "employee removed");
        log_activity(
            &self.event_bus,
            "deleted",
            Some(actor.user_id),
            &previous,
            None,
            actor.context.clone(),
        );
        Ok(())
    }

    /// Renames an employee and reassigns their role. No identity-level change.
    pub async fn update_employee(&self, actor: &Actor, request: UpdateEmployeeRequest) -> AppResult<Employee> {
        request.validate()?;
        let facility_id = request.facility_id;
        self.checker
            .require(actor.user_id, facility_id, PermissionSection::Employees, PermissionAction::Update)
            .await?;

        let previous = self.employees.get_employee(facility_id, request.user_id).await?;

        if let Some(role_id) = request.role_id {
            if !self.roles.role_exists_in_facility(facility_id, role_id).await? {
                return Err(AppError::not_found("role not found"));
            }
        }

        let mut tx = self.employees.pool().begin().await?;
        update_profile_name(&mut tx, request.user_id, &request.name).await?;
        update_membership_role(&mut tx, facility_id, request.user_id, request.role_id).await?;
        tx.commit().await?;

        let employee = self.employees.get_employee(facility_id, request.user_id).await?;
        log_activity(
            &self.event_bus,
            "updated",
            Some(actor.user_id),
            &employee,
            Some(&previous),
            actor.context.clone(),
        );
        Ok(employee)
    }
}
