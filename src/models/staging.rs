//! In-memory edit buffer for a role's permissions.
//!
//! A create/edit session collects pairs here and only turns them into a
//! request when saved; dropping the buffer abandons the edit.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::authz::{PermissionAction, PermissionSection};
use crate::errors::AppError;
use crate::extract::Validate;
use crate::models::role::{CreateRoleRequest, PermissionInput, Role, UpdateRoleRequest};

#[derive(Debug, Clone, Default)]
pub struct StagedPermissions {
    entries: Vec<PermissionInput>,
    removed: BTreeSet<i64>,
}

impl StagedPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an edit session from the saved state of a role.
    pub fn load(role: &Role) -> Self {
        Self {
            entries: role
                .permissions
                .iter()
                .map(|p| PermissionInput {
                    action: p.action,
                    section: p.section,
                    id: Some(p.id),
                })
                .collect(),
            removed: BTreeSet::new(),
        }
    }

    pub fn entries(&self) -> &[PermissionInput] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn removed_ids(&self) -> Vec<i64> {
        self.removed.iter().copied().collect()
    }

    /// Stages a pair. Both halves are required and the exact pair must not
    /// already be staged.
    pub fn add(
        &mut self,
        action: Option<PermissionAction>,
        section: Option<PermissionSection>,
    ) -> Result<(), AppError> {
        let (Some(action), Some(section)) = (action, section) else {
            return Err(AppError::validation("an action and a section must be selected"));
        };

        if self
            .entries
            .iter()
            .any(|p| p.action == action && p.section == section)
        {
            return Err(AppError::validation(format!(
                "{section}:{action} has already been added"
            )));
        }

        self.entries.push(PermissionInput { action, section, id: None });
        Ok(())
    }

    /// Removes by position. A removed saved row is remembered for deletion
    /// on the next save.
    pub fn remove(&mut self, index: usize) -> Option<PermissionInput> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        if let Some(id) = removed.id {
            self.removed.insert(id);
        }
        Some(removed)
    }

    pub fn create_payload(&self, role_name: &str, facility_id: Uuid) -> Result<CreateRoleRequest, AppError> {
        self.ensure_not_empty()?;
        let request = CreateRoleRequest {
            role_name: role_name.to_string(),
            permissions: self
                .entries
                .iter()
                .map(|p| PermissionInput { id: None, ..p.clone() })
                .collect(),
            facility_id,
        };
        request.validate()?;
        Ok(request)
    }

    /// Only unsaved entries are sent as additions; saved ones are left alone.
    pub fn update_payload(&self, role_id: Uuid, role_name: &str) -> Result<UpdateRoleRequest, AppError> {
        self.ensure_not_empty()?;
        let request = UpdateRoleRequest {
            role_id,
            new_role_name: role_name.to_string(),
            new_permissions: self.entries.iter().filter(|p| p.id.is_none()).cloned().collect(),
            permissions_to_delete: self.removed_ids(),
        };
        request.validate()?;
        Ok(request)
    }

    fn ensure_not_empty(&self) -> Result<(), AppError> {
        if self.entries.is_empty() {
            return Err(AppError::validation(
                "at least one action and section combination is required",
            ));
        }
        Ok(())
    }
}
