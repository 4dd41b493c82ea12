use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::auth::{Actor, Claims, Role};
use crate::database::models::UserProfile;
use crate::database::Repository;
use crate::error::ApiError;
use crate::state::AppState;

/// The caller as the database knows them right now, not as the token says.
#[derive(Clone, Debug, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Stored role name; may differ from `role` for custom roles.
    pub role_name: String,
    #[serde(skip)]
    pub claims: Claims,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// Middleware that re-loads the user named by the JWT and resolves their
/// current role. Must run after [`super::jwt_auth_middleware`].
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let profile = Repository::<UserProfile>::new(state.pool.clone())
        .select_one(&[("id", claims.user_id)])
        .await?;

    let profile = profile.ok_or_else(|| {
        tracing::warn!(user_id = claims.user_id, "Token names a user that no longer exists");
        ApiError::unauthorized("User no longer exists")
    })?;

    tracing::debug!(user = %profile.username, role = %profile.role, "User validated");

    request.extensions_mut().insert(CurrentUser {
        id: profile.id,
        username: profile.username,
        email: profile.email,
        role: Role::from_name(&profile.role),
        role_name: profile.role,
        claims,
    });

    Ok(next.run(request).await)
}

/// Elevated tier guard. Must run after [`validate_user_middleware`].
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("User validation required before admin check"))?;

    if !user.role.is_admin() {
        tracing::warn!(user = %user.username, "Non-admin refused from elevated route");
        return Err(ApiError::forbidden("Administrator role required"));
    }

    Ok(next.run(request).await)
}
