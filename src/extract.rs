use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Request-level checks that serde alone cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// JSON body extractor that reports the failing field path and then runs
/// [`Validate`] on the typed payload.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| AppError::validation(err.body_text()))?;

        let value = parse_json::<T>(&bytes)?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        AppError::validation(format!("{}: {}", path, err.into_inner()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::CreateRoleRequest;

    #[test]
    fn reports_the_offending_field() {
        let body = br#"{"roleName":"coach","facilityId":"f","permissions":[]}"#;
        let err = parse_json::<CreateRoleRequest>(body).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.starts_with("facilityId"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reports_unknown_enum_values_with_their_path() {
        let body = format!(
            r#"{{"roleName":"coach","facilityId":"{}","permissions":[{{"action":"archive","section":"roles"}}]}}"#,
            uuid::Uuid::new_v4()
        );
        let err = parse_json::<CreateRoleRequest>(body.as_bytes()).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.starts_with("permissions[0].action"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
