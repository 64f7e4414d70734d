pub mod bootstrap;
pub mod employees;
pub mod roles;

pub use employees::EmployeeLifecycle;
pub use roles::RoleService;

use uuid::Uuid;

use crate::events::RequestContext;

/// Authenticated caller of a privileged operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub context: Option<RequestContext>,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id, context: None }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }
}
