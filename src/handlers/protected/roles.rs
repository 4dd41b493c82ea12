use axum::extract::State;

use crate::database::models::Role;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/roles
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(state.roles().list().await?))
}
