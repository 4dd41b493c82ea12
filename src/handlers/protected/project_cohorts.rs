use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::models::ProjectCohort;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::membership_service::{AssignmentFilter, NewProjectCohort};
use crate::state::AppState;

/// GET /api/project_cohorts?project_id=&cohort_id=
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<AssignmentFilter>,
) -> ApiResult<Vec<ProjectCohort>> {
    Ok(ApiResponse::success(state.memberships().list_assignments(filter).await?))
}

/// POST /api/project_cohorts - `{ "project_id": 1, "cohort_id": 2, "classroom_id": null }`
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewProjectCohort>,
) -> ApiResult<ProjectCohort> {
    let assignment = state.memberships().assign(&user.actor(), input).await?;
    Ok(ApiResponse::created(assignment))
}

/// DELETE /api/project_cohorts/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    state.memberships().unassign(&user.actor(), id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
