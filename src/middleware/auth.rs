use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::{bearer_token, validate_jwt, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

/// JWT authentication middleware: verifies the bearer token, refuses revoked
/// ones, and injects the decoded [`crate::auth::Claims`] into the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()?;

    let token = bearer_token(header)?;
    let claims = validate_jwt(token, &state.config.security).map_err(|e| {
        tracing::warn!("Rejected token: {}", e);
        e
    })?;

    if state.users().is_revoked(&claims).await? {
        tracing::warn!(user_id = claims.user_id, "Rejected revoked token");
        return Err(AuthError::Revoked.into());
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
