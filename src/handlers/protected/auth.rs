use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::user_service::IssuedToken;
use crate::state::AppState;

/// GET /api/auth/whoami - The caller's profile with their current role
pub async fn whoami(Extension(user): Extension<CurrentUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "role": user.role_name,
        "is_admin": user.role.is_admin(),
        "token_expires_at": user.claims.exp,
    })))
}

/// POST /api/auth/refresh - Issue a fresh token and revoke the presented one
pub async fn refresh(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<IssuedToken> {
    let users = state.users();
    let profile = users.get(user.id).await?;
    let issued = users.issue_token(profile)?;
    users.revoke(&user.claims).await?;

    Ok(ApiResponse::success(issued))
}

/// POST /api/auth/logout - Revoke the presented token
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Value> {
    state.users().revoke(&user.claims).await?;
    tracing::info!(user = %user.username, "Logged out");

    Ok(ApiResponse::success(json!({ "logged_out": true })))
}
