use uuid::Uuid;

use super::Actor;
use crate::authz::{Permission, PermissionAction, PermissionChecker, PermissionSection};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, EventBus};
use crate::extract::Validate;
use crate::models::role::{CreateRoleRequest, DeleteRoleRequest, PermissionInput, Role, UpdateRoleRequest};
use crate::stores::RoleStore;

/// Role management behind the `roles` permission section.
#[derive(Clone)]
pub struct RoleService {
    store: RoleStore,
    checker: PermissionChecker,
    event_bus: EventBus,
}

impl RoleService {
    pub fn new(store: RoleStore, checker: PermissionChecker, event_bus: EventBus) -> Self {
        Self {
            store,
            checker,
            event_bus,
        }
    }

    pub async fn list_roles(&self, actor: &Actor, facility_id: Uuid) -> AppResult<Vec<Role>> {
        self.checker
            .require(actor.user_id, facility_id, PermissionSection::Roles, PermissionAction::Read)
            .await?;
        self.store.get_all_roles(facility_id).await
    }

    pub async fn get_role(&self, actor: &Actor, facility_id: Uuid, role_id: Uuid) -> AppResult<Role> {
        self.checker
            .require(actor.user_id, facility_id, PermissionSection::Roles, PermissionAction::Read)
            .await?;
        self.store
            .get_role_by_id(facility_id, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("role not found"))
    }

    /// Creates a role and emits an audit event.
    pub async fn create_role(&self, actor: &Actor, request: CreateRoleRequest) -> AppResult<Role> {
        request.validate()?;
        self.checker
            .require(actor.user_id, request.facility_id, PermissionSection::Roles, PermissionAction::Create)
            .await?;

        let permissions: Vec<Permission> = request.permissions.iter().map(PermissionInput::permission).collect();
        let role = self
            .store
            .create_role(request.facility_id, &request.role_name, &permissions)
            .await?;

        log_activity(&self.event_bus, "created", Some(actor.user_id), &role, None, actor.context.clone());
        Ok(role)
    }

    /// Applies a staged edit. The request only names the role, so its
    /// facility is resolved first and the caller is checked against it.
    /// An unknown role is denied the same way as a foreign one.
    pub async fn update_role(&self, actor: &Actor, request: UpdateRoleRequest) -> AppResult<Role> {
        request.validate()?;
        let Some(facility_id) = self.store.find_role_facility(request.role_id).await? else {
            tracing::debug!(role_id = %request.role_id, user_id = %actor.user_id, "update of unknown role denied");
            return Err(AppError::PermissionDenied);
        };

        self.checker
            .require(actor.user_id, facility_id, PermissionSection::Roles, PermissionAction::Update)
            .await?;

        let previous = self.store.get_role_by_id(facility_id, request.role_id).await?;
        let role = self
            .store
            .update_role(
                request.role_id,
                &request.new_role_name,
                &request.new_permissions,
                &request.permissions_to_delete,
            )
            .await?;

        log_activity(
            &self.event_bus,
            "updated",
            Some(actor.user_id),
            &role,
            previous.as_ref(),
            actor.context.clone(),
        );
        Ok(role)
    }

    pub async fn delete_role(&self, actor: &Actor, request: DeleteRoleRequest) -> AppResult<()> {
        request.validate()?;
        self.checker
            .require(actor.user_id, request.facility_id, PermissionSection::Roles, PermissionAction::Delete)
            .await?;

        let role = self
            .store
            .get_role_by_id(request.facility_id, request.role_id)
            .await?
            .ok_or_else(|| AppError::not_found("role not found"))?;
        self.store.delete_role(request.facility_id, request.role_id).await?;

        log_activity(&self.event_bus, "deleted", Some(actor.user_id), &role, None, actor.context.clone());
        Ok(())
    }
}
