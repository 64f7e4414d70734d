pub mod employees;
pub mod facilities;
pub mod roles;

pub use employees::EmployeeStore;
pub use roles::RoleStore;
