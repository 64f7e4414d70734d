use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::locale::Locale;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Carries no reason so callers cannot tell "no role" from "role lacks permission".
    #[error("permission denied")]
    PermissionDenied,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("persistence error")]
    Persistence(#[from] sqlx::Error),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentState(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn token(err: impl Into<String>) -> Self {
        Self::Token(err.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Status code embedded in the response envelope.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_)
            | AppError::InconsistentState(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Transport status. Expected domain outcomes travel as 200 and the
    /// envelope carries the real code; only unexpected failures use 5xx.
    pub fn transport_status(&self) -> StatusCode {
        if self.is_unexpected() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        }
    }

    pub fn is_unexpected(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::PermissionDenied => "permission_denied",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Persistence(_) => "persistence",
            AppError::InconsistentState(_) => "inconsistent_state",
            AppError::Configuration(_) => "configuration",
            AppError::Token(_) => "token",
            AppError::Internal(_) => "internal",
        }
    }

    /// Short user-facing message in the configured language.
    pub fn public_message(&self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, AppError::Validation(_)) => "The request contains invalid data.",
            (Locale::En, AppError::InvalidArgument(_)) => "The requested operation is not allowed.",
            (Locale::En, AppError::Unauthorized(_) | AppError::Token(_)) => "Invalid auth token.",
            (Locale::En, AppError::PermissionDenied) => "You do not have permission to perform this action.",
            (Locale::En, AppError::NotFound(_)) => "The requested resource was not found.",
            (Locale::En, AppError::Conflict(_)) => "The resource already exists.",
            (Locale::En, _) => "Unexpected error, please try again later.",
            (Locale::Es, AppError::Validation(_)) => "La solicitud contiene datos inválidos.",
            (Locale::Es, AppError::InvalidArgument(_)) => "La operación solicitada no está permitida.",
            (Locale::Es, AppError::Unauthorized(_) | AppError::Token(_)) => "Token de autenticación inválido.",
            (Locale::Es, AppError::PermissionDenied) => "No tienes permiso para realizar esta acción.",
            (Locale::Es, AppError::NotFound(_)) => "No se encontró el recurso solicitado.",
            (Locale::Es, AppError::Conflict(_)) => "El recurso ya existe.",
            (Locale::Es, _) => "Error inesperado, inténtalo de nuevo más tarde.",
        }
    }

    /// Detail safe to hand back to the caller. Server-side failures and
    /// authorization denials never expose theirs.
    pub fn public_detail(&self) -> Option<String> {
        match self {
            AppError::Validation(detail)
            | AppError::InvalidArgument(detail)
            | AppError::NotFound(detail)
            | AppError::Conflict(detail) => Some(detail.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unexpected() {
            tracing::error!(error = %self, source = ?std::error::Error::source(&self), "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let status = self.status_code();
        let body = ErrorBody {
            code: self.code().to_string(),
            message: self.public_message(Locale::current()).to_string(),
            details: self.public_detail(),
        };

        let envelope = crate::envelope::Envelope::<()>::failure(status, body);
        (self.transport_status(), Json(envelope)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_travel_as_http_200() {
        assert_eq!(AppError::PermissionDenied.transport_status(), StatusCode::OK);
        assert_eq!(AppError::not_found("role").transport_status(), StatusCode::OK);
        assert_eq!(AppError::conflict("email").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::inconsistent("orphan").transport_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_public() {
        let err = AppError::inconsistent("identity 42 left without profile");
        assert_eq!(err.public_detail(), None);
        assert_eq!(AppError::PermissionDenied.public_detail(), None);
        assert_eq!(
            AppError::validation("name: must not be empty").public_detail().as_deref(),
            Some("name: must not be empty")
        );
    }

    #[test]
    fn messages_are_localized() {
        let err = AppError::PermissionDenied;
        assert_ne!(err.public_message(Locale::En), err.public_message(Locale::Es));
    }
}
