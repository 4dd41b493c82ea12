use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::DatabaseManager;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin_middleware, validate_user_middleware};
use crate::state::AppState;

/// Assemble the full router: public, protected and elevated tiers plus the
/// global CORS and tracing layers.
pub fn app(state: AppState) -> Router {
    let protected = protected_routes()
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let elevated = elevated_routes()
        .route_layer(from_fn(require_admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected)
        .merge(elevated);

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn protected_routes() -> Router<AppState> {
    use protected::{auth, classes, cohorts, project_cohorts, project_members, projects, roles, users};

    Router::new()
        // Session
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        // Users and roles
        .route("/api/roles", get(roles::list))
        .route("/api/users", get(users::list))
        .route("/api/users/:id", get(users::show).put(users::update).patch(users::update))
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/:id",
            get(projects::show)
                .put(projects::update)
                .patch(projects::update)
                .delete(projects::delete),
        )
        .route("/api/projects/:id/members", get(projects::members))
        // Cohorts and classes
        .route("/api/cohorts", get(cohorts::list).post(cohorts::create))
        .route(
            "/api/cohorts/:id",
            get(cohorts::show)
                .put(cohorts::update)
                .patch(cohorts::update)
                .delete(cohorts::delete),
        )
        .route("/api/cohorts/:id/classes", get(cohorts::classes))
        .route("/api/classes", get(classes::list).post(classes::create))
        .route(
            "/api/classes/:id",
            get(classes::show)
                .put(classes::update)
                .patch(classes::update)
                .delete(classes::delete),
        )
        // Join tables
        .route(
            "/api/project_members",
            get(project_members::list).post(project_members::create),
        )
        .route("/api/project_members/:id", delete(project_members::delete))
        .route(
            "/api/project_cohorts",
            get(project_cohorts::list).post(project_cohorts::create),
        )
        .route("/api/project_cohorts/:id", delete(project_cohorts::delete))
}

fn elevated_routes() -> Router<AppState> {
    use elevated::admin;

    Router::new()
        .route("/api/admin/roles", post(admin::create_role))
        .route("/api/admin/roles/:id", delete(admin::delete_role))
        .route("/api/admin/users/:id/role", put(admin::change_role))
        .route("/api/admin/users/:id", delete(admin::delete_user))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Cohort API",
            "version": version,
            "description": "Student projects organised by cohort and class",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami, /api/auth/refresh, /api/auth/logout (protected)",
                "users": "/api/users[/:id], /api/roles (protected)",
                "projects": "/api/projects[/:id[/members]] (protected)",
                "cohorts": "/api/cohorts[/:id[/classes]] (protected)",
                "classes": "/api/classes[/:id] (protected)",
                "joins": "/api/project_members[/:id], /api/project_cohorts[/:id] (protected)",
                "admin": "/api/admin/roles[/:id], /api/admin/users/:id[/role] (admin)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
