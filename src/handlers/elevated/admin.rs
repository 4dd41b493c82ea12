use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{Role, UserProfile};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::role_service::NewRole;
use crate::services::user_service::DeletedUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: String,
}

/// POST /api/admin/roles - `{ "name": "mentor" }`
pub async fn create_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewRole>,
) -> ApiResult<Role> {
    let role = state.roles().create(&user.actor(), input).await?;
    Ok(ApiResponse::created(role))
}

/// DELETE /api/admin/roles/:id - 409 while any user holds the role
pub async fn delete_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    state.roles().delete(&user.actor(), id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// PUT /api/admin/users/:id/role - `{ "role": "admin" }`
pub async fn change_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<RoleChange>,
) -> ApiResult<UserProfile> {
    let updated = state.users().change_role(&user.actor(), id, &input.role).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/admin/users/:id - Hands the user's projects to the caller
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<DeletedUser> {
    let deleted = state.users().delete(&user.actor(), id).await?;
    Ok(ApiResponse::success(deleted))
}
