use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::models::{Classroom, Cohort};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::cohort_service::{CohortChanges, NewCohort};
use crate::state::AppState;

/// GET /api/cohorts
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Cohort>> {
    Ok(ApiResponse::success(state.cohorts().list().await?))
}

/// POST /api/cohorts (admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewCohort>,
) -> ApiResult<Cohort> {
    let cohort = state.cohorts().create(&user.actor(), input).await?;
    Ok(ApiResponse::created(cohort))
}

/// GET /api/cohorts/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Cohort> {
    Ok(ApiResponse::success(state.cohorts().get(id).await?))
}

/// PUT|PATCH /api/cohorts/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<CohortChanges>,
) -> ApiResult<Cohort> {
    let cohort = state.cohorts().update(&user.actor(), id, changes).await?;
    Ok(ApiResponse::success(cohort))
}

/// DELETE /api/cohorts/:id (admin) - Cascades to classes, projects and join rows
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let report = state.cohorts().delete(&user.actor(), id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": report })))
}

/// GET /api/cohorts/:id/classes
pub async fn classes(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Vec<Classroom>> {
    Ok(ApiResponse::success(state.cohorts().classes(id).await?))
}
