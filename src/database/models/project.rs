use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub github_link: Option<String>,
    pub deployed_link: Option<String>,
    pub poster_url: Option<String>,
    pub owner_id: i64,
    pub class_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Table for Project {
    const TABLE: &'static str = "projects";
    const NOUN: &'static str = "Project";
}
