//! Authorization module - permission catalog, policy engine and checker
//!
//! A caller's rights inside a facility come from their membership:
//! - facility admins are allowed everything
//! - everyone else gets exactly the (section, action) pairs of their role
//! - no membership, no role, or a role that cannot be resolved denies

mod catalog;
mod checker;
mod evaluator;
mod principal;

pub use catalog::{
    label_for, label_for_locale, LabelKind, Permission, PermissionAction, PermissionSection, ACTIONS, SECTIONS,
};
pub use checker::PermissionChecker;
pub use evaluator::{DefaultPolicyEvaluator, PolicyEvaluator};
pub use principal::Principal;
