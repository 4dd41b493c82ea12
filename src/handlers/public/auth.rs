// handlers/public/auth.rs - POST /auth/register and POST /auth/login

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::{IssuedToken, RegisterUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

/// POST /auth/register - Create an account
///
/// Expected Input:
/// ```json
/// { "username": "ada", "email": "ada@example.com", "password": "...", "role": "student" }
/// ```
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> ApiResult<UserProfile> {
    let security = &state.config.security;
    if !security.allow_registration {
        return Err(ApiError::forbidden("Registration is disabled"));
    }

    let user = state
        .users()
        .register(input, security.allow_role_on_register)
        .await?;
    Ok(ApiResponse::created(user))
}

/// POST /auth/login - Exchange credentials for a JWT
///
/// Expected Input: `{ "email": "...", "password": "..." }`, with `username`
/// accepted in place of `email`.
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "token": "eyJ...", "token_type": "Bearer", "expires_in": 604800, "user": { ... } } }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> ApiResult<IssuedToken> {
    let identifier = input
        .email
        .or(input.username)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("email or username is required"))?;

    let users = state.users();
    let user = users.authenticate(&identifier, &input.password).await?;
    let issued = users.issue_token(user)?;

    tracing::info!(user = %issued.user.username, "Login successful");
    Ok(ApiResponse::success(issued))
}
