use std::sync::Arc;

use uuid::Uuid;

use super::catalog::{PermissionAction, PermissionSection};
use super::evaluator::PolicyEvaluator;
use super::principal::Principal;
use crate::errors::{AppError, AppResult};
use crate::stores::{EmployeeStore, RoleStore};

/// Single authorization gate in front of every privileged operation.
#[derive(Clone)]
pub struct PermissionChecker {
    employees: EmployeeStore,
    roles: RoleStore,
    evaluator: Arc<dyn PolicyEvaluator>,
}

impl PermissionChecker {
    pub fn new(employees: EmployeeStore, roles: RoleStore, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        Self {
            employees,
            roles,
            evaluator,
        }
    }

    /// Builds the caller's principal for one facility. `None` when the user
    /// is not an employee there. A role that cannot be loaded, or that
    /// belongs to another facility, is left unresolved.
    pub async fn load_principal(&self, user_id: Uuid, facility_id: Uuid) -> AppResult<Option<Principal>> {
        let Some(membership) = self.employees.find_membership(facility_id, user_id).await? else {
            return Ok(None);
        };

        let principal = Principal::new(user_id, facility_id).with_admin(membership.is_admin);
        let Some(role_id) = membership.role_id else {
            return Ok(Some(principal));
        };

        let principal = match self.roles.get_role_by_id(facility_id, role_id).await {
            Ok(Some(role)) => principal.with_role(role_id, role.permission_set()),
            Ok(None) => principal.with_unresolved_role(role_id),
            Err(err) => {
                tracing::warn!(%user_id, %facility_id, %role_id, error = %err, "role lookup failed");
                principal.with_unresolved_role(role_id)
            }
        };
        Ok(Some(principal))
    }

    /// Allow/deny decision. Lookup failures deny.
    pub async fn authorize(
        &self,
        user_id: Uuid,
        facility_id: Uuid,
        section: PermissionSection,
        action: PermissionAction,
    ) -> bool {
        match self.load_principal(user_id, facility_id).await {
            Ok(Some(principal)) => self.evaluator.can(&principal, section, action).await,
            Ok(None) => {
                tracing::debug!(%user_id, %facility_id, %section, %action, "not an employee of facility");
                false
            }
            Err(err) => {
                tracing::warn!(%user_id, %facility_id, error = %err, "principal lookup failed");
                false
            }
        }
    }

    /// Same decision, as a `PermissionDenied` error.
    pub async fn require(
        &self,
        user_id: Uuid,
        facility_id: Uuid,
        section: PermissionSection,
        action: PermissionAction,
    ) -> AppResult<()> {
        if self.authorize(user_id, facility_id, section, action).await {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub async fn is_facility_employee(&self, user_id: Uuid, facility_id: Uuid) -> AppResult<bool> {
        Ok(self.employees.find_membership(facility_id, user_id).await?.is_some())
    }

    /// Principal for a caller that must at least be an employee.
    pub async fn require_member(&self, user_id: Uuid, facility_id: Uuid) -> AppResult<Principal> {
        self.load_principal(user_id, facility_id)
            .await?
            .ok_or(AppError::PermissionDenied)
    }
}
