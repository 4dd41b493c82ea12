// handlers/protected/projects.rs - /api/projects[/:id[/members]]

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::models::{Project, UserProfile};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::project_service::{NewProject, ProjectChanges, ProjectFilter};
use crate::state::AppState;

/// GET /api/projects?owner_id=&class_id=
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Vec<Project>> {
    Ok(ApiResponse::success(state.projects().list(filter).await?))
}

/// POST /api/projects
///
/// Expected Input:
/// ```json
/// {
///   "name": "Tracker",
///   "description": "At least ten characters",
///   "github_link": "https://github.com/acme/tracker",
///   "deployed_link": null,
///   "poster_url": null,
///   "class_id": 3,
///   "owner_id": null
/// }
/// ```
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewProject>,
) -> ApiResult<Project> {
    let project = state.projects().create(&user.actor(), input).await?;
    Ok(ApiResponse::created(project))
}

/// GET /api/projects/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Project> {
    Ok(ApiResponse::success(state.projects().get(id).await?))
}

/// PUT|PATCH /api/projects/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<ProjectChanges>,
) -> ApiResult<Project> {
    let project = state.projects().update(&user.actor(), id, changes).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:id - Removes the project with its memberships and
/// cohort assignments
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let report = state.projects().delete(&user.actor(), id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": report })))
}

/// GET /api/projects/:id/members
pub async fn members(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Vec<UserProfile>> {
    Ok(ApiResponse::success(state.projects().members(id).await?))
}
