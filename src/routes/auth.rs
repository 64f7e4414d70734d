use axum::extract::State;
use axum::http::HeaderMap;

use crate::app::AppState;
use crate::envelope::Envelope;
use crate::errors::AppResult;
use crate::events::{log_activity, RequestContext};
use crate::extract::ValidJson;
use crate::identity;
use crate::jwt::AuthUser;
use crate::models::employee::Profile;
use crate::models::identity::{AcceptInviteRequest, AuthResponse, Identity, LoginRequest};
use crate::stores::EmployeeStore;

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; `data` holds the token", body = AuthResponse),
        (status = 401, description = "Invalid credentials (embedded statusCode)")
    ),
    security(())
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> AppResult<Envelope<AuthResponse>> {
    let identity = identity::authenticate(&state.pool, &payload.email, &payload.password).await?;
    let response = issue_token(&state, &identity).await?;

    log_activity(
        &state.event_bus,
        "login",
        Some(identity.id),
        &identity,
        None,
        Some(RequestContext::from_headers(&headers)),
    );
    Ok(Envelope::ok(response))
}

/// Completes an invitation by setting the first password.
#[utoipa::path(
    post,
    path = "/auth/accept-invite",
    tag = "Auth",
    request_body = AcceptInviteRequest,
    responses(
        (status = 200, description = "Identity activated; `data` holds the token", body = AuthResponse),
        (status = 404, description = "Unknown or already used invitation (embedded statusCode)")
    ),
    security(())
)]
pub async fn accept_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<AcceptInviteRequest>,
) -> AppResult<Envelope<AuthResponse>> {
    let identity = identity::accept_invite(&state.pool, &payload.token, &payload.password).await?;
    let response = issue_token(&state, &identity).await?;

    log_activity(
        &state.event_bus,
        "activated",
        Some(identity.id),
        &identity,
        None,
        Some(RequestContext::from_headers(&headers)),
    );
    Ok(Envelope::ok(response))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current profile", body = Profile))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Envelope<Profile>> {
    let profile = EmployeeStore::new(state.pool.clone()).get_profile(auth.user_id).await?;
    Ok(Envelope::ok(profile))
}

async fn issue_token(state: &AppState, identity: &Identity) -> AppResult<AuthResponse> {
    let user = EmployeeStore::new(state.pool.clone()).get_profile(identity.id).await?;
    let token = state.jwt.encode(identity.id, identity.claim)?;
    Ok(AuthResponse { token, user })
}
