pub mod auth;
pub mod catalog;
pub mod employees;
pub mod facilities;
pub mod health;
pub mod roles;

use axum::http::HeaderMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::events::RequestContext;
use crate::jwt::AuthUser;
use crate::services::Actor;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub(crate) fn actor(auth: &AuthUser, headers: &HeaderMap) -> Actor {
    Actor::new(auth.user_id).with_context(RequestContext::from_headers(headers))
}
