use async_trait::async_trait;

use super::catalog::{PermissionAction, PermissionSection};
use super::principal::Principal;

/// Policy evaluator trait for pluggable authorization logic
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Check if the principal may perform `action` on `section` in its facility
    async fn can(&self, principal: &Principal, section: PermissionSection, action: PermissionAction) -> bool;
}

/// Default policy evaluator for facility roles
///
/// Evaluation order:
/// 1. facility admin -> allow
/// 2. no role assigned -> deny
/// 3. role could not be resolved -> deny
/// 4. role grants the exact (section, action) pair -> allow
/// 5. deny
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicyEvaluator;

impl DefaultPolicyEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PolicyEvaluator for DefaultPolicyEvaluator {
    async fn can(&self, principal: &Principal, section: PermissionSection, action: PermissionAction) -> bool {
        if principal.is_admin {
            tracing::debug!(
                user_id = %principal.user_id,
                facility_id = %principal.facility_id,
                %section,
                %action,
                "facility admin bypass"
            );
            return true;
        }

        let Some(role_id) = principal.role_id else {
            tracing::debug!(
                user_id = %principal.user_id,
                facility_id = %principal.facility_id,
                %section,
                %action,
                "no role assigned"
            );
            return false;
        };

        if principal.permissions.is_none() {
            tracing::warn!(
                user_id = %principal.user_id,
                facility_id = %principal.facility_id,
                %role_id,
                "assigned role could not be resolved"
            );
            return false;
        }

        if principal.has_permission(section, action) {
            tracing::debug!(
                user_id = %principal.user_id,
                %role_id,
                %section,
                %action,
                "role permission match"
            );
            return true;
        }

        tracing::debug!(
            user_id = %principal.user_id,
            %role_id,
            %section,
            %action,
            "permission denied"
        );
        false
    }
}
