pub mod password;
pub mod policy;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::{hash_password, verify_password};
pub use policy::{authorize, Action, Actor, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    /// Token id, recorded on logout so the token stops working before `exp`.
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, username: String, role: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user_id,
            username,
            role,
            jti: Uuid::new_v4(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the decoded claims.
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value.strip_prefix("Bearer ").ok_or(AuthError::MalformedHeader)?.trim();

    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        AppConfig::development().security
    }

    #[test]
    fn token_round_trip_keeps_claims() {
        let claims = Claims::new(7, "ada".to_string(), "admin".to_string(), 1);
        let token = generate_jwt(&claims, &security()).unwrap();

        let decoded = validate_jwt(&token, &security()).unwrap();
        assert_eq!(decoded.user_id, 7);
        assert_eq!(decoded.role, "admin");
        assert_eq!(decoded.jti, claims.jti);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::new(1, "ada".to_string(), "student".to_string(), 1);
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&claims, &security()).unwrap();

        assert!(matches!(validate_jwt(&token, &security()), Err(AuthError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let claims = Claims::new(1, "ada".to_string(), "student".to_string(), 1);
        let mut other = security();
        other.jwt_secret = "someone-else".to_string();
        let token = generate_jwt(&claims, &other).unwrap();

        assert!(matches!(validate_jwt(&token, &security()), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let mut empty = security();
        empty.jwt_secret.clear();
        let claims = Claims::new(1, "ada".to_string(), "student".to_string(), 1);

        assert!(matches!(generate_jwt(&claims, &empty), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Token abc")), Err(AuthError::MalformedHeader)));
        assert!(matches!(bearer_token(Some("Bearer   ")), Err(AuthError::MalformedHeader)));
    }
}
