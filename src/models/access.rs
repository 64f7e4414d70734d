use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{label_for, LabelKind, Permission, Principal, ACTIONS, SECTIONS};

// =============================================================================
// EFFECTIVE PERMISSIONS (computed)
// =============================================================================

/// What the caller may do inside one facility. Clients use it to hide
/// controls; the server never trusts it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermissions {
    pub facility_id: Uuid,
    pub user_id: Uuid,
    pub is_admin: bool,
    pub role_id: Option<Uuid>,
    pub permissions: Vec<Permission>,
}

impl From<&Principal> for EffectivePermissions {
    fn from(principal: &Principal) -> Self {
        Self {
            facility_id: principal.facility_id,
            user_id: principal.user_id,
            is_admin: principal.is_admin,
            role_id: principal.role_id,
            permissions: principal.effective_permissions(),
        }
    }
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionCatalog {
    pub sections: Vec<CatalogEntry>,
    pub actions: Vec<CatalogEntry>,
}

impl PermissionCatalog {
    pub fn current() -> Self {
        let entry = |kind: LabelKind, value: &str| CatalogEntry {
            value: value.to_string(),
            label: label_for(kind, value),
        };

        Self {
            sections: SECTIONS.iter().map(|s| entry(LabelKind::Section, s.as_str())).collect(),
            actions: ACTIONS.iter().map(|a| entry(LabelKind::Action, a.as_str())).collect(),
        }
    }
}
