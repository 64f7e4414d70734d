use uuid::Uuid;

use crate::authz::{PermissionAction, PermissionSection};
use crate::errors::AppError;

// Ids are stored as hyphenated TEXT; anything else is a corrupt row.

pub fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|e| AppError::internal(format!("invalid uuid '{}': {}", s, e)))
}

pub fn parse_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match s.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(Some(parse_uuid(value)?)),
        _ => Ok(None),
    }
}

pub fn parse_section(s: &str) -> Result<PermissionSection, AppError> {
    s.parse().map_err(AppError::internal)
}

pub fn parse_action(s: &str) -> Result<PermissionAction, AppError> {
    s.parse().map_err(AppError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);
        assert!(parse_uuid("nope").is_err());
        assert_eq!(parse_opt_uuid(None).unwrap(), None);
        assert_eq!(parse_opt_uuid(Some("")).unwrap(), None);
    }

    #[test]
    fn rejects_unknown_catalog_values() {
        assert_eq!(parse_section("roles").unwrap(), PermissionSection::Roles);
        assert!(parse_action("archive").is_err());
    }
}
