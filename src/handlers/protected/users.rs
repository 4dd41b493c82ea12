use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::user_service::UserChanges;
use crate::state::AppState;

/// GET /api/users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    Ok(ApiResponse::success(state.users().list().await?))
}

/// GET /api/users/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(state.users().get(id).await?))
}

/// PUT|PATCH /api/users/:id - Update username, email or password.
/// Absent fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<UserChanges>,
) -> ApiResult<UserProfile> {
    let updated = state.users().update(&user.actor(), id, changes).await?;
    Ok(ApiResponse::success(updated))
}
