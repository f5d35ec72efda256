use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{verify_jwt, Caller, Role};
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::state::AppState;

pub const NO_TOKEN: &str = "No token provided.";
pub const BAD_TOKEN: &str = "Failed to authenticate token.";
pub const ROLE_DENIED: &str = "Unauthorized Access.";

/// Roles accepted on ordinary member routes.
pub const MEMBERS: &[Role] = &[Role::Admin, Role::User];
pub const ADMINS: &[Role] = &[Role::Admin];

/// Token from `x-access-token`, falling back to `Authorization: Bearer`.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get("x-access-token").and_then(|v| v.to_str().ok()) {
        return Some(token.trim()).filter(|t| !t.is_empty());
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the caller for a route open to `allowed` roles.
pub fn authorize(headers: &HeaderMap, allowed: &[Role], security: &SecurityConfig) -> Result<Caller, ApiError> {
    let token = extract_token(headers).ok_or_else(|| ApiError::forbidden(NO_TOKEN))?;

    let claims = verify_jwt(security, token).map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        ApiError::authentication_failed(BAD_TOKEN)
    })?;

    if !allowed.contains(&claims.role) {
        tracing::warn!("Role {} denied on a route open to {:?}", claims.role.code(), allowed);
        return Err(ApiError::unauthorized(ROLE_DENIED));
    }
    Ok(Caller::from(claims))
}

async fn guard(state: &AppState, allowed: &[Role], mut request: Request, next: Next) -> Response {
    match authorize(request.headers(), allowed, &state.config.security) {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Admins and regular users.
pub async fn require_member(State(state): State<AppState>, request: Request, next: Next) -> Response {
    guard(&state, MEMBERS, request, next).await
}

pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    guard(&state, ADMINS, request, next).await
}
