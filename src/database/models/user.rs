use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Table;

/// Raw `users` row, including the password hash. Never serialized as-is.
#[derive(Debug, Clone, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Table for User {
    const TABLE: &'static str = "users";
    const NOUN: &'static str = "User";
}

/// Row of the `user_profiles` view: public fields plus the role name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role_id: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Table for UserProfile {
    const TABLE: &'static str = "user_profiles";
    const NOUN: &'static str = "User";
}
