use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl Table for Role {
    const TABLE: &'static str = "roles";
    const NOUN: &'static str = "Role";
}
