use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
}

impl Table for ProjectMember {
    const TABLE: &'static str = "project_members";
    const NOUN: &'static str = "Project member";
}
