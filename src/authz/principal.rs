use std::collections::HashSet;

use uuid::Uuid;

use super::catalog::{Permission, PermissionAction, PermissionSection};

/// The caller as seen from one facility: their membership flags and the
/// permissions granted by their role.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub is_admin: bool,
    pub role_id: Option<Uuid>,
    /// `None` when the role could not be resolved.
    pub permissions: Option<HashSet<Permission>>,
}

impl Principal {
    pub fn new(user_id: Uuid, facility_id: Uuid) -> Self {
        Self {
            user_id,
            facility_id,
            is_admin: false,
            role_id: None,
            permissions: None,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn with_role(mut self, role_id: Uuid, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.role_id = Some(role_id);
        self.permissions = Some(permissions.into_iter().collect());
        self
    }

    /// Role id set on the membership but the role itself is gone.
    pub fn with_unresolved_role(mut self, role_id: Uuid) -> Self {
        self.role_id = Some(role_id);
        self.permissions = None;
        self
    }

    pub fn has_permission(&self, section: PermissionSection, action: PermissionAction) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|granted| granted.contains(&Permission::new(section, action)))
    }

    /// Every pair this principal may exercise, admin bypass included.
    pub fn effective_permissions(&self) -> Vec<Permission> {
        let mut granted: Vec<Permission> = if self.is_admin {
            super::catalog::SECTIONS
                .iter()
                .flat_map(|section| {
                    super::catalog::ACTIONS
                        .iter()
                        .map(move |action| Permission::new(*section, *action))
                })
                .collect()
        } else {
            self.permissions.iter().flatten().copied().collect()
        };
        granted.sort();
        granted
    }
}
