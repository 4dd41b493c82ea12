use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::Classroom;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::classroom_service::{ClassroomChanges, NewClassroom};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassQuery {
    pub cohort_id: Option<i64>,
}

/// GET /api/classes?cohort_id=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ClassQuery>,
) -> ApiResult<Vec<Classroom>> {
    Ok(ApiResponse::success(state.classes().list(query.cohort_id).await?))
}

/// POST /api/classes (admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewClassroom>,
) -> ApiResult<Classroom> {
    let class = state.classes().create(&user.actor(), input).await?;
    Ok(ApiResponse::created(class))
}

/// GET /api/classes/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Classroom> {
    Ok(ApiResponse::success(state.classes().get(id).await?))
}

/// PUT|PATCH /api/classes/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<ClassroomChanges>,
) -> ApiResult<Classroom> {
    let class = state.classes().update(&user.actor(), id, changes).await?;
    Ok(ApiResponse::success(class))
}

/// DELETE /api/classes/:id (admin)
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let report = state.classes().delete(&user.actor(), id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": report })))
}
