//! Closed set of permission sections and actions, plus their display labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::locale::Locale;

/// Functional area subject to access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionSection {
    Roles,
    Employees,
}

/// Operation kind subject to access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Delete,
}

pub const SECTIONS: [PermissionSection; 2] = [PermissionSection::Employees, PermissionSection::Roles];

pub const ACTIONS: [PermissionAction; 4] = [
    PermissionAction::Create,
    PermissionAction::Read,
    PermissionAction::Update,
    PermissionAction::Delete,
];

impl PermissionSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionSection::Roles => "roles",
            PermissionSection::Employees => "employees",
        }
    }
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Create => "create",
            PermissionAction::Read => "read",
            PermissionAction::Update => "update",
            PermissionAction::Delete => "delete",
        }
    }
}

impl fmt::Display for PermissionSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SECTIONS
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("unknown permission section '{s}'"))
    }
}

impl FromStr for PermissionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ACTIONS
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown permission action '{s}'"))
    }
}

/// A `(section, action)` pair granted to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    pub section: PermissionSection,
    pub action: PermissionAction,
}

impl Permission {
    pub const fn new(section: PermissionSection, action: PermissionAction) -> Self {
        Self { section, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.action)
    }
}

/// `employees:create` style, as typed on the command line.
impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, action) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <section>:<action>, got '{s}'"))?;
        Ok(Permission::new(section.trim().parse()?, action.trim().parse()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Section,
    Action,
}

/// Label for a section or action value, falling back to the raw value.
pub fn label_for(kind: LabelKind, value: &str) -> String {
    label_for_locale(kind, value, Locale::current())
}

pub fn label_for_locale(kind: LabelKind, value: &str, locale: Locale) -> String {
    let label = match kind {
        LabelKind::Section => value.parse::<PermissionSection>().ok().map(|s| section_label(s, locale)),
        LabelKind::Action => value.parse::<PermissionAction>().ok().map(|a| action_label(a, locale)),
    };
    label.map(str::to_string).unwrap_or_else(|| value.to_string())
}

fn section_label(section: PermissionSection, locale: Locale) -> &'static str {
    match (locale, section) {
        (Locale::En, PermissionSection::Roles) => "Roles",
        (Locale::En, PermissionSection::Employees) => "Employees",
        (Locale::Es, PermissionSection::Roles) => "Roles",
        (Locale::Es, PermissionSection::Employees) => "Empleados",
    }
}

fn action_label(action: PermissionAction, locale: Locale) -> &'static str {
    match (locale, action) {
        (Locale::En, PermissionAction::Create) => "Create",
        (Locale::En, PermissionAction::Read) => "Read",
        (Locale::En, PermissionAction::Update) => "Update",
        (Locale::En, PermissionAction::Delete) => "Delete",
        (Locale::Es, PermissionAction::Create) => "Crear",
        (Locale::Es, PermissionAction::Read) => "Leer",
        (Locale::Es, PermissionAction::Update) => "Editar",
        (Locale::Es, PermissionAction::Delete) => "Eliminar",
    }
}
