use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::models::ProjectMember;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::membership_service::{MemberFilter, NewProjectMember};
use crate::state::AppState;

/// GET /api/project_members?project_id=&user_id=
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<MemberFilter>,
) -> ApiResult<Vec<ProjectMember>> {
    Ok(ApiResponse::success(state.memberships().list_members(filter).await?))
}

/// POST /api/project_members - `{ "project_id": 1, "user_id": 2 }`
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewProjectMember>,
) -> ApiResult<ProjectMember> {
    let member = state.memberships().add_member(&user.actor(), input).await?;
    Ok(ApiResponse::created(member))
}

/// DELETE /api/project_members/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    state.memberships().remove_member(&user.actor(), id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
